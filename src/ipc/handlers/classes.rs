use serde_json::json;

use crate::ipc::error::{ok, service_err};
use crate::ipc::helpers::{
    opt_str_param, opt_u32_param, require_app, require_identity, str_param, unwrap_or_return,
};
use crate::ipc::types::{AppState, Request};
use crate::store::ClassPatch;

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let name = unwrap_or_return!(str_param(req, "name"));
    let description = opt_str_param(req, "description");
    match app.classes.create_class(identity, &name, description) {
        Ok(class) => ok(&req.id, json!({ "class": class })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let classes = app.classes.list_classes_for_teacher(identity);
    ok(&req.id, json!({ "classes": classes }))
}

fn handle_list_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let classes = app.classes.list_classes_for_student(identity);
    ok(&req.id, json!({ "classes": classes }))
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let class_id = unwrap_or_return!(str_param(req, "classId"));
    let patch = ClassPatch {
        class_name: opt_str_param(req, "name"),
        description: opt_str_param(req, "description"),
    };
    match app.classes.update_class(identity, &class_id, &patch) {
        // False covers both a missing class and someone else's class;
        // callers check the flag rather than assuming success.
        Ok(updated) => ok(&req.id, json!({ "updated": updated })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let class_id = unwrap_or_return!(str_param(req, "classId"));
    match app.classes.delete_class(identity, &class_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_add_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let class_id = unwrap_or_return!(str_param(req, "classId"));
    let student_id = unwrap_or_return!(str_param(req, "studentId"));
    match app
        .classes
        .add_student_to_class(identity, &class_id, &student_id)
    {
        Ok(()) => ok(&req.id, json!({ "enrolled": true })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_remove_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let class_id = unwrap_or_return!(str_param(req, "classId"));
    let student_id = unwrap_or_return!(str_param(req, "studentId"));
    match app
        .classes
        .remove_student_from_class(identity, &class_id, &student_id)
    {
        Ok(()) => ok(&req.id, json!({ "removed": true })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_members(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let class_id = unwrap_or_return!(str_param(req, "classId"));
    let members = app.classes.list_members(identity, &class_id);
    ok(&req.id, json!({ "members": members }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let _identity = unwrap_or_return!(require_identity(req));
    let limit = unwrap_or_return!(opt_u32_param(req, "limit"));
    let offset = unwrap_or_return!(opt_u32_param(req, "offset")).unwrap_or(0);
    let students = app.classes.list_all_students(limit, offset);
    ok(
        &req.id,
        json!({ "students": students, "offset": offset }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.create" => Some(handle_create(state, req)),
        "classes.list" => Some(handle_list(state, req)),
        "classes.listForStudent" => Some(handle_list_for_student(state, req)),
        "classes.update" => Some(handle_update(state, req)),
        "classes.delete" => Some(handle_delete(state, req)),
        "classes.addStudent" => Some(handle_add_student(state, req)),
        "classes.removeStudent" => Some(handle_remove_student(state, req)),
        "classes.members" => Some(handle_members(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        _ => None,
    }
}

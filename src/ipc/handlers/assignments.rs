use serde_json::json;

use crate::ipc::error::{ok, service_err};
use crate::ipc::helpers::{
    opt_datetime_param, opt_str_param, require_app, require_identity, str_param, unwrap_or_return,
};
use crate::ipc::types::{AppState, Request};

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let class_id = unwrap_or_return!(str_param(req, "classId"));
    let title = unwrap_or_return!(str_param(req, "title"));
    let description = opt_str_param(req, "description");
    let scenario_id = opt_str_param(req, "scenarioId");
    let due_date = unwrap_or_return!(opt_datetime_param(req, "dueDate"));

    match app.assignments.create_assignment(
        identity,
        &class_id,
        &title,
        description,
        scenario_id,
        due_date,
    ) {
        Ok(assignment) => ok(&req.id, json!({ "assignment": assignment })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_list_for_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let class_id = unwrap_or_return!(str_param(req, "classId"));
    let assignments = app.assignments.list_for_class(identity, &class_id);
    ok(&req.id, json!({ "assignments": assignments }))
}

fn handle_list_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let assignments = app.assignments.list_for_student(identity);
    ok(&req.id, json!({ "assignments": assignments }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.create" => Some(handle_create(state, req)),
        "assignments.listForClass" => Some(handle_list_for_class(state, req)),
        "assignments.listForStudent" => Some(handle_list_for_student(state, req)),
        _ => None,
    }
}

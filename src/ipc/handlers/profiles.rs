use serde_json::json;

use crate::identity::WebhookPayload;
use crate::ipc::error::{err, ok, service_err};
use crate::ipc::helpers::{
    opt_str_param, require_app, require_identity, str_param, unwrap_or_return,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use crate::store::ProfilePatch;

fn handle_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    match app.profiles.resolve_profile(identity) {
        Ok(profile) => ok(&req.id, json!({ "profile": profile })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_role(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    match app.profiles.get_role(identity) {
        Ok(role) => ok(&req.id, json!({ "role": role })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_sync(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let synced = app.profiles.sync_from_identity_provider(identity);
    ok(&req.id, json!({ "synced": synced }))
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let patch = ProfilePatch {
        first_name: opt_str_param(req, "firstName"),
        last_name: opt_str_param(req, "lastName"),
        avatar_url: opt_str_param(req, "avatarUrl"),
    };
    match app.profiles.update_profile(identity, &patch) {
        Ok(updated) => ok(&req.id, json!({ "updated": updated })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_set_role(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let raw = unwrap_or_return!(str_param(req, "role"));
    let Some(role) = Role::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            "params.role must be 'student' or 'teacher'",
            None,
        );
    };
    match app.profiles.set_role(identity, role) {
        Ok(profile) => ok(&req.id, json!({ "profile": profile })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_webhook(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let payload: WebhookPayload = match serde_json::from_value(req.params.clone()) {
        Ok(p) => p,
        Err(e) => return err(&req.id, "bad_params", format!("invalid webhook payload: {e}"), None),
    };
    match app.profiles.handle_webhook(payload) {
        Ok(created) => ok(&req.id, json!({ "profileCreated": created })),
        Err(e) => service_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.resolve" => Some(handle_resolve(state, req)),
        "profile.role" => Some(handle_role(state, req)),
        "profile.sync" => Some(handle_sync(state, req)),
        "profile.update" => Some(handle_update(state, req)),
        "profile.setRole" => Some(handle_set_role(state, req)),
        "identity.webhook" => Some(handle_webhook(state, req)),
        _ => None,
    }
}

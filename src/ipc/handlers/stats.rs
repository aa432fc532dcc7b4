use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::{require_app, require_identity, unwrap_or_return};
use crate::ipc::types::{AppState, Request};

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let stats = app.stats.get_student_stats(identity);
    ok(&req.id, json!({ "stats": stats }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.get" => Some(handle_get(state, req)),
        _ => None,
    }
}

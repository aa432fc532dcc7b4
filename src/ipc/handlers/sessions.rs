use serde_json::json;

use crate::ipc::error::{err, ok, service_err};
use crate::ipc::helpers::{
    opt_str_param, opt_u32_param, require_app, require_identity, str_param, unwrap_or_return,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{SessionInput, TutorType};
use crate::session::{EndResult, SaveOutcome};

fn tutor_type_param(req: &Request) -> Result<TutorType, serde_json::Value> {
    let raw = str_param(req, "tutorType")?;
    TutorType::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "params.tutorType must be one of conversation, grammar, pronunciation, business, beginner",
            None,
        )
    })
}

fn handle_begin(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let call_id = unwrap_or_return!(str_param(req, "callId"));
    let companion_id = unwrap_or_return!(str_param(req, "companionId"));
    let tutor_type = unwrap_or_return!(tutor_type_param(req));
    let topic = unwrap_or_return!(str_param(req, "topic"));
    let assignment_id = opt_str_param(req, "assignmentId");

    match app.calls.begin(
        &call_id,
        identity,
        &companion_id,
        tutor_type,
        &topic,
        assignment_id,
    ) {
        Ok(status) => ok(
            &req.id,
            json!({ "callId": call_id, "status": status.as_str() }),
        ),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_call_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let call_id = unwrap_or_return!(str_param(req, "callId"));
    match app.calls.call_start(&call_id, identity) {
        Ok(status) => ok(
            &req.id,
            json!({ "callId": call_id, "status": status.as_str() }),
        ),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_message(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let call_id = unwrap_or_return!(str_param(req, "callId"));
    let role = unwrap_or_return!(str_param(req, "role"));
    let content = unwrap_or_return!(str_param(req, "content"));
    match app.calls.message(&call_id, identity, &role, &content) {
        Ok(lines) => ok(&req.id, json!({ "lines": lines })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_error(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let call_id = unwrap_or_return!(str_param(req, "callId"));
    match app.calls.error(&call_id, identity) {
        Ok(()) => ok(&req.id, json!({ "abandoned": true })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_end(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let call_id = unwrap_or_return!(str_param(req, "callId"));
    match app.calls.end(&call_id, identity, &app.sessions) {
        Ok(EndResult::Abandoned) => ok(
            &req.id,
            json!({ "status": "abandoned", "saveStatus": "skipped" }),
        ),
        Ok(EndResult::Completed(SaveOutcome::Saved(report))) => ok(
            &req.id,
            json!({ "status": "finished", "saveStatus": "saved", "report": report }),
        ),
        // The call stays finished; only the save is reported as failed so
        // the UI can show "report not saved".
        Ok(EndResult::Completed(SaveOutcome::Failed(message))) => ok(
            &req.id,
            json!({ "status": "finished", "saveStatus": "failed", "error": message }),
        ),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let companion_id = unwrap_or_return!(str_param(req, "companionId"));
    let transcript = unwrap_or_return!(str_param(req, "transcript"));
    let tutor_type = unwrap_or_return!(tutor_type_param(req));
    let topic = unwrap_or_return!(str_param(req, "topic"));
    let session_duration = match req.params.get("sessionDuration").and_then(|v| v.as_i64()) {
        Some(d) if d >= 0 => d,
        _ => {
            return err(
                &req.id,
                "bad_params",
                "params.sessionDuration must be a non-negative number of seconds",
                None,
            )
        }
    };

    let input = SessionInput {
        companion_id,
        transcript,
        assignment_id: opt_str_param(req, "assignmentId"),
        session_duration,
        tutor_type,
        topic,
        audio_url: opt_str_param(req, "audioUrl"),
    };
    match app.sessions.save_session_report(identity, input) {
        Ok(report) => ok(&req.id, json!({ "report": report })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let report_id = unwrap_or_return!(str_param(req, "reportId"));
    match app.sessions.get_session_report(identity, &report_id) {
        Ok(report) => ok(&req.id, json!({ "report": report })),
        Err(e) => service_err(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = unwrap_or_return!(require_app(state, req));
    let identity = unwrap_or_return!(require_identity(req));
    let limit = unwrap_or_return!(opt_u32_param(req, "limit"));
    let reports = app.sessions.list_reports(identity, limit);
    ok(&req.id, json!({ "reports": reports }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.begin" => Some(handle_begin(state, req)),
        "session.callStart" => Some(handle_call_start(state, req)),
        "session.message" => Some(handle_message(state, req)),
        "session.error" => Some(handle_error(state, req)),
        "session.end" => Some(handle_end(state, req)),
        "reports.save" => Some(handle_save(state, req)),
        "reports.get" => Some(handle_get(state, req)),
        "reports.list" => Some(handle_list(state, req)),
        _ => None,
    }
}

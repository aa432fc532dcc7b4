use serde_json::json;

use crate::error::ServiceError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn service_err(id: &str, e: &ServiceError) -> serde_json::Value {
    let code = match e {
        ServiceError::Unauthenticated => "unauthenticated",
        ServiceError::NotFound => "not_found",
        ServiceError::Validation(_) => "bad_params",
        ServiceError::BadState(_) => "bad_state",
        ServiceError::Store(_) => "store_failed",
    };
    err(id, code, e.to_string(), None)
}

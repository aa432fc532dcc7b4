use chrono::{DateTime, Utc};

use crate::ipc::error::err;
use crate::ipc::types::{App, AppState, Request};

/// Handlers work in terms of `Result<_, serde_json::Value>` where the error
/// side is a ready-to-send response line.
pub type HandlerResult<T> = Result<T, serde_json::Value>;

macro_rules! unwrap_or_return {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(resp) => return resp,
        }
    };
}
pub(crate) use unwrap_or_return;

pub fn require_app<'a>(state: &'a mut AppState, req: &Request) -> HandlerResult<&'a mut App> {
    state
        .app
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn require_identity<'a>(req: &'a Request) -> HandlerResult<&'a str> {
    match req.identity.as_deref() {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(err(
            &req.id,
            "unauthenticated",
            "request carries no authenticated identity",
            None,
        )),
    }
}

pub fn str_param(req: &Request, key: &str) -> HandlerResult<String> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) => Ok(v.to_string()),
        None => Err(err(
            &req.id,
            "bad_params",
            format!("missing params.{key}"),
            None,
        )),
    }
}

pub fn opt_str_param(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub fn opt_u32_param(req: &Request, key: &str) -> HandlerResult<Option<u32>> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) if n <= u32::MAX as u64 => Ok(Some(n as u32)),
            _ => Err(err(
                &req.id,
                "bad_params",
                format!("params.{key} must be a non-negative integer"),
                None,
            )),
        },
    }
}

pub fn opt_datetime_param(req: &Request, key: &str) -> HandlerResult<Option<DateTime<Utc>>> {
    let Some(raw) = req.params.get(key).and_then(|v| v.as_str()) else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|d| Some(d.with_timezone(&Utc)))
        .map_err(|_| {
            err(
                &req.id,
                "bad_params",
                format!("params.{key} must be an RFC 3339 timestamp"),
                None,
            )
        })
}

use std::path::PathBuf;
use std::rc::Rc;

use serde::Deserialize;

use crate::assignments::AssignmentService;
use crate::classes::ClassService;
use crate::profile::ProfileService;
use crate::session::{CallTracker, SessionService};
use crate::stats::StatsService;
use crate::store::sqlite::SqliteStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    /// Authenticated external user id, supplied by the front end after the
    /// identity provider has verified the session token.
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Services wired over one workspace store. Built when a workspace is
/// selected; the single store instance backs every store trait.
pub struct App {
    pub profiles: ProfileService,
    pub classes: ClassService,
    pub assignments: AssignmentService,
    pub sessions: SessionService,
    pub stats: StatsService,
    pub calls: CallTracker,
}

impl App {
    pub fn new(store: Rc<SqliteStore>, allow_role_change: bool) -> App {
        App {
            profiles: ProfileService::new(store.clone(), store.clone(), allow_role_change),
            classes: ClassService::new(store.clone(), store.clone()),
            assignments: AssignmentService::new(store.clone()),
            sessions: SessionService::new(store.clone()),
            stats: StatsService::new(store),
            calls: CallTracker::new(),
        }
    }
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub app: Option<App>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            app: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

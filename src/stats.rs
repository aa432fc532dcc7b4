use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

use crate::model::{SessionReport, StudentStats};
use crate::store::ReportStore;

/// Derives dashboard statistics from a student's report history.
pub struct StatsService {
    reports: Rc<dyn ReportStore>,
}

impl StatsService {
    pub fn new(reports: Rc<dyn ReportStore>) -> Self {
        Self { reports }
    }

    /// Reflects the store at call time; degrades to the zero stats when the
    /// history cannot be read.
    pub fn get_student_stats(&self, student_id: &str) -> StudentStats {
        match self.reports.reports_for_student(student_id) {
            Ok(reports) => compute_stats(&reports, Utc::now()),
            Err(e) => {
                tracing::warn!(student_id, "stats read failed: {e}");
                compute_stats(&[], Utc::now())
            }
        }
    }
}

pub fn compute_stats(reports: &[SessionReport], now: DateTime<Utc>) -> StudentStats {
    let total_sessions = reports.len();

    let week_ago = now - Duration::days(7);
    let this_week_sessions = reports.iter().filter(|r| r.created_at > week_ago).count();

    let average_score = if reports.is_empty() {
        0
    } else {
        let sum: f64 = reports
            .iter()
            .map(|r| (r.pronunciation_score + r.fluency_score) as f64 / 2.0)
            .sum();
        (sum / reports.len() as f64).round() as i64
    };

    let last_session_date = reports.iter().map(|r| r.created_at).max();

    StudentStats {
        total_sessions,
        this_week_sessions,
        average_score,
        last_session_date,
    }
}

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::analysis::{self, Analysis};
use crate::error::{ServiceError, ServiceResult};
use crate::model::{SessionInput, SessionReport, TutorType};
use crate::store::ReportStore;

const REPORT_LIST_DEFAULT: u32 = 10;

/// Lifecycle of one tutoring call as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Connecting,
    Active,
    Finished,
}

impl CallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Connecting => "connecting",
            CallStatus::Active => "active",
            CallStatus::Finished => "finished",
        }
    }
}

/// What happened to the single save attempt a finished call gets.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Saved(SessionReport),
    Failed(String),
}

/// Result of ending a call. A call that never reached Active is abandoned
/// without a save attempt.
#[derive(Debug, Clone)]
pub enum EndResult {
    Completed(SaveOutcome),
    Abandoned,
}

#[derive(Debug)]
struct CallSession {
    companion_id: String,
    tutor_type: TutorType,
    topic: String,
    assignment_id: Option<String>,
    status: CallStatus,
    started_at: Option<DateTime<Utc>>,
    lines: Vec<String>,
    outcome: Option<SaveOutcome>,
}

/// Server-side view of in-flight calls. Client-chosen call ids are
/// namespaced per student, so one student's ids reveal nothing about
/// another's. Tracking the terminal transition here is what makes the
/// at-most-one-save guarantee observable: a repeated end replays the
/// recorded outcome instead of saving again.
#[derive(Default)]
pub struct CallTracker {
    calls: HashMap<(String, String), CallSession>,
}

fn call_key(student_id: &str, call_id: &str) -> (String, String) {
    (student_id.to_string(), call_id.to_string())
}

impl CallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(
        &mut self,
        call_id: &str,
        student_id: &str,
        companion_id: &str,
        tutor_type: TutorType,
        topic: &str,
        assignment_id: Option<String>,
    ) -> ServiceResult<CallStatus> {
        // Finished calls stay around only until the student's next begin,
        // which bounds the replay window and keeps the map from growing
        // with the daemon's uptime.
        self.calls
            .retain(|(s, _), c| !(s == student_id && c.status == CallStatus::Finished));

        let key = call_key(student_id, call_id);
        if self.calls.contains_key(&key) {
            return Err(ServiceError::BadState("begin"));
        }
        self.calls.insert(
            key,
            CallSession {
                companion_id: companion_id.to_string(),
                tutor_type,
                topic: topic.to_string(),
                assignment_id,
                status: CallStatus::Connecting,
                started_at: None,
                lines: Vec::new(),
                outcome: None,
            },
        );
        Ok(CallStatus::Connecting)
    }

    fn owned_call(&mut self, call_id: &str, student_id: &str) -> ServiceResult<&mut CallSession> {
        self.calls
            .get_mut(&call_key(student_id, call_id))
            .ok_or(ServiceError::NotFound)
    }

    /// The voice SDK confirmed the call; transcript accumulation starts.
    pub fn call_start(&mut self, call_id: &str, student_id: &str) -> ServiceResult<CallStatus> {
        let call = self.owned_call(call_id, student_id)?;
        if call.status != CallStatus::Connecting {
            return Err(ServiceError::BadState("callStart"));
        }
        call.status = CallStatus::Active;
        call.started_at = Some(Utc::now());
        Ok(CallStatus::Active)
    }

    /// One finalized utterance, in SDK order.
    pub fn message(
        &mut self,
        call_id: &str,
        student_id: &str,
        role: &str,
        content: &str,
    ) -> ServiceResult<usize> {
        let call = self.owned_call(call_id, student_id)?;
        if call.status != CallStatus::Active {
            return Err(ServiceError::BadState("message"));
        }
        call.lines.push(format!("{role}: {content}"));
        Ok(call.lines.len())
    }

    /// SDK error before or during the call: the call is abandoned and no
    /// report is saved.
    pub fn error(&mut self, call_id: &str, student_id: &str) -> ServiceResult<()> {
        self.owned_call(call_id, student_id)?;
        self.calls.remove(&call_key(student_id, call_id));
        Ok(())
    }

    /// Terminal transition. Exactly one save attempt per call; a repeated
    /// end returns the recorded outcome.
    pub fn end(
        &mut self,
        call_id: &str,
        student_id: &str,
        reports: &SessionService,
    ) -> ServiceResult<EndResult> {
        let call = self.owned_call(call_id, student_id)?;
        match call.status {
            CallStatus::Connecting => {
                self.calls.remove(&call_key(student_id, call_id));
                return Ok(EndResult::Abandoned);
            }
            CallStatus::Finished => {
                let outcome = call.outcome.clone().ok_or(ServiceError::BadState("end"))?;
                return Ok(EndResult::Completed(outcome));
            }
            CallStatus::Active => {}
        }

        call.status = CallStatus::Finished;
        let duration = call
            .started_at
            .map(|t| (Utc::now() - t).num_seconds().max(0))
            .unwrap_or(0);
        let input = SessionInput {
            companion_id: call.companion_id.clone(),
            transcript: call.lines.join("\n"),
            assignment_id: call.assignment_id.clone(),
            session_duration: duration,
            tutor_type: call.tutor_type,
            topic: call.topic.clone(),
            audio_url: None,
        };

        let outcome = match reports.save_session_report(student_id, input) {
            Ok(report) => SaveOutcome::Saved(report),
            Err(e) => {
                tracing::error!(call_id, "session report save failed: {e}");
                SaveOutcome::Failed(e.to_string())
            }
        };
        // Borrow restarted: record the outcome on the finished call.
        if let Some(call) = self.calls.get_mut(&call_key(student_id, call_id)) {
            call.outcome = Some(outcome.clone());
        }
        Ok(EndResult::Completed(outcome))
    }

    pub fn status(&self, call_id: &str, student_id: &str) -> Option<CallStatus> {
        self.calls
            .get(&call_key(student_id, call_id))
            .map(|c| c.status)
    }
}

/// Persistence side of the pipeline: analysis, the report insert, and the
/// best-effort progress update.
pub struct SessionService {
    reports: Rc<dyn ReportStore>,
}

impl SessionService {
    pub fn new(reports: Rc<dyn ReportStore>) -> Self {
        Self { reports }
    }

    /// Analysis cannot fail the save; only the store write can, and that
    /// error goes back to the caller so the UI can say "report not saved".
    pub fn save_session_report(
        &self,
        student_id: &str,
        input: SessionInput,
    ) -> ServiceResult<SessionReport> {
        let analysis = analysis::analyze_transcript(&input.transcript);

        let report = SessionReport {
            report_id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            assignment_id: input.assignment_id,
            companion_id: input.companion_id,
            transcript: input.transcript,
            pronunciation_score: analysis.pronunciation_score,
            fluency_score: analysis.fluency_score,
            grammar_feedback: analysis.grammar_feedback.clone(),
            session_duration: input.session_duration,
            tutor_type: input.tutor_type,
            topic: input.topic,
            vocabulary_used: analysis.vocabulary_used.clone(),
            improvements: analysis.improvements.clone(),
            achievements: analysis.achievements.clone(),
            audio_url: input.audio_url,
            created_at: Utc::now(),
        };
        self.reports.insert_report(&report)?;

        if !update_student_progress(student_id, &analysis) {
            tracing::warn!(student_id, "student progress update failed");
        }
        Ok(report)
    }

    pub fn get_session_report(
        &self,
        student_id: &str,
        report_id: &str,
    ) -> ServiceResult<SessionReport> {
        self.reports
            .get_report(student_id, report_id)?
            .ok_or(ServiceError::NotFound)
    }

    /// Newest-first, default 10. Degrades to empty on store failure.
    pub fn list_reports(&self, student_id: &str, limit: Option<u32>) -> Vec<SessionReport> {
        let limit = limit.unwrap_or(REPORT_LIST_DEFAULT).max(1);
        match self.reports.list_reports(student_id, limit) {
            Ok(reports) => reports,
            Err(e) => {
                tracing::warn!(student_id, "report listing failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Aggregate-progress hook. There is no progress table yet, so this only
/// logs what a future aggregate would receive; callers must treat failure
/// as non-blocking either way.
fn update_student_progress(student_id: &str, analysis: &Analysis) -> bool {
    tracing::info!(
        student_id,
        pronunciation = analysis.pronunciation_score,
        fluency = analysis.fluency_score,
        "student progress updated"
    );
    true
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two roles every authorization decision keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named tutor specialization; selects the persona the external voice SDK
/// runs with. The SDK config itself lives client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorType {
    Conversation,
    Grammar,
    Pronunciation,
    Business,
    Beginner,
}

impl TutorType {
    pub fn as_str(self) -> &'static str {
        match self {
            TutorType::Conversation => "conversation",
            TutorType::Grammar => "grammar",
            TutorType::Pronunciation => "pronunciation",
            TutorType::Business => "business",
            TutorType::Beginner => "beginner",
        }
    }

    pub fn parse(s: &str) -> Option<TutorType> {
        match s {
            "conversation" => Some(TutorType::Conversation),
            "grammar" => Some(TutorType::Grammar),
            "pronunciation" => Some(TutorType::Pronunciation),
            "business" => Some(TutorType::Business),
            "beginner" => Some(TutorType::Beginner),
            _ => None,
        }
    }
}

/// Internal user record, keyed by the external identity id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Roster view of a student profile, trimmed for the directory listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Current identity-provider record for one external user. Mirrored locally
/// from webhook events; the provider remains the source of truth.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub class_id: String,
    pub teacher_id: String,
    pub class_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub assignment_id: String,
    pub class_id: String,
    pub title: String,
    pub description: Option<String>,
    pub scenario_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-time urgency classification; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Overdue,
}

/// Persisted record of one completed tutoring call. Immutable after insert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub report_id: String,
    pub student_id: String,
    pub assignment_id: Option<String>,
    pub companion_id: String,
    pub transcript: String,
    pub pronunciation_score: i64,
    pub fluency_score: i64,
    pub grammar_feedback: String,
    pub session_duration: i64,
    pub tutor_type: TutorType,
    pub topic: String,
    pub vocabulary_used: Vec<String>,
    pub improvements: Vec<String>,
    pub achievements: Vec<String>,
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for one report insert; scores come from the analysis step.
#[derive(Debug, Clone)]
pub struct SessionInput {
    pub companion_id: String,
    pub transcript: String,
    pub assignment_id: Option<String>,
    pub session_duration: i64,
    pub tutor_type: TutorType,
    pub topic: String,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub total_sessions: usize,
    pub this_week_sessions: usize,
    pub average_score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_session_date: Option<DateTime<Utc>>,
}

use chrono::Utc;
use rusqlite::{params_from_iter, types::Value, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::identity::IdentityProvider;
use crate::model::{
    Assignment, Class, IdentityRecord, Profile, Role, SessionReport, StudentSummary, TutorType,
};
use crate::store::{ClassPatch, ClassStore, MemberInsert, ProfilePatch, ProfileStore, ReportStore};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

fn bad_column(idx: usize, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("invalid {what}").into(),
    )
}

fn profile_from_row(row: &Row) -> rusqlite::Result<Profile> {
    let role: String = row.get(1)?;
    Ok(Profile {
        user_id: row.get(0)?,
        role: Role::parse(&role).ok_or_else(|| bad_column(1, "role"))?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        avatar_url: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const PROFILE_COLS: &str = "user_id, role, first_name, last_name, avatar_url, created_at, updated_at";

fn class_from_row(row: &Row) -> rusqlite::Result<Class> {
    Ok(Class {
        class_id: row.get(0)?,
        teacher_id: row.get(1)?,
        class_name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

const CLASS_COLS: &str = "class_id, teacher_id, class_name, description, created_at, updated_at";

fn assignment_from_row(row: &Row) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        assignment_id: row.get(0)?,
        class_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        scenario_id: row.get(4)?,
        due_date: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const ASSIGNMENT_COLS: &str =
    "assignment_id, class_id, title, description, scenario_id, due_date, created_at, updated_at";

fn string_list(raw: &str, idx: usize) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|_| bad_column(idx, "json list"))
}

fn report_from_row(row: &Row) -> rusqlite::Result<SessionReport> {
    let tutor: String = row.get(9)?;
    let vocabulary: String = row.get(11)?;
    let improvements: String = row.get(12)?;
    let achievements: String = row.get(13)?;
    Ok(SessionReport {
        report_id: row.get(0)?,
        student_id: row.get(1)?,
        assignment_id: row.get(2)?,
        companion_id: row.get(3)?,
        transcript: row.get(4)?,
        pronunciation_score: row.get(5)?,
        fluency_score: row.get(6)?,
        grammar_feedback: row.get(7)?,
        session_duration: row.get(8)?,
        tutor_type: TutorType::parse(&tutor).ok_or_else(|| bad_column(9, "tutor type"))?,
        topic: row.get(10)?,
        vocabulary_used: string_list(&vocabulary, 11)?,
        improvements: string_list(&improvements, 12)?,
        achievements: string_list(&achievements, 13)?,
        audio_url: row.get(14)?,
        created_at: row.get(15)?,
    })
}

const REPORT_COLS: &str = "report_id, student_id, assignment_id, companion_id, transcript, \
     pronunciation_score, fluency_score, grammar_feedback, session_duration, tutor_type, \
     topic, vocabulary_used, improvements, achievements, audio_url, created_at";

impl ProfileStore for SqliteStore {
    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLS} FROM profiles WHERE user_id = ?");
        Ok(self
            .conn
            .query_row(&sql, [user_id], profile_from_row)
            .optional()?)
    }

    fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO profiles(user_id, role, first_name, last_name, avatar_url, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                profile.user_id,
                profile.role.as_str(),
                profile.first_name,
                profile.last_name,
                profile.avatar_url,
                profile.created_at,
                profile.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_display(&self, user_id: &str, patch: &ProfilePatch) -> Result<bool, StoreError> {
        // COALESCE keeps fields the patch does not mention.
        let rows = self.conn.execute(
            "UPDATE profiles SET
               first_name = COALESCE(?, first_name),
               last_name = COALESCE(?, last_name),
               avatar_url = COALESCE(?, avatar_url),
               updated_at = ?
             WHERE user_id = ?",
            rusqlite::params![
                patch.first_name,
                patch.last_name,
                patch.avatar_url,
                Utc::now(),
                user_id,
            ],
        )?;
        Ok(rows > 0)
    }

    fn replace_display(&self, user_id: &str, patch: &ProfilePatch) -> Result<bool, StoreError> {
        let rows = self.conn.execute(
            "UPDATE profiles SET first_name = ?, last_name = ?, avatar_url = ?, updated_at = ?
             WHERE user_id = ?",
            rusqlite::params![
                patch.first_name,
                patch.last_name,
                patch.avatar_url,
                Utc::now(),
                user_id,
            ],
        )?;
        Ok(rows > 0)
    }

    fn set_role(&self, user_id: &str, role: Role) -> Result<bool, StoreError> {
        let rows = self.conn.execute(
            "UPDATE profiles SET role = ?, updated_at = ? WHERE user_id = ?",
            rusqlite::params![role.as_str(), Utc::now(), user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_students(&self, limit: u32, offset: u32) -> Result<Vec<StudentSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, first_name, last_name FROM profiles
             WHERE role = 'student'
             ORDER BY first_name, user_id
             LIMIT ? OFFSET ?",
        )?;
        let rows = stmt.query_map([limit, offset], |row| {
            Ok(StudentSummary {
                user_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn profiles_with_role(&self, ids: &[String], role: Role) -> Result<Vec<Profile>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {PROFILE_COLS} FROM profiles
             WHERE role = ? AND user_id IN ({placeholders})
             ORDER BY first_name, user_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<Value> = std::iter::once(Value::from(role.as_str().to_string()))
            .chain(ids.iter().map(|id| Value::from(id.clone())))
            .collect();
        let rows = stmt.query_map(params_from_iter(params), profile_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn record_identity(&self, rec: &IdentityRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO identities(user_id, first_name, last_name, image_url, updated_at)
             VALUES(?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
               first_name = excluded.first_name,
               last_name = excluded.last_name,
               image_url = excluded.image_url,
               updated_at = excluded.updated_at",
            rusqlite::params![
                rec.user_id,
                rec.first_name,
                rec.last_name,
                rec.image_url,
                Utc::now(),
            ],
        )?;
        Ok(())
    }
}

impl IdentityProvider for SqliteStore {
    fn fetch(&self, user_id: &str) -> anyhow::Result<Option<IdentityRecord>> {
        let rec = self
            .conn
            .query_row(
                "SELECT user_id, first_name, last_name, image_url FROM identities WHERE user_id = ?",
                [user_id],
                |row| {
                    Ok(IdentityRecord {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        image_url: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(rec)
    }
}

impl ClassStore for SqliteStore {
    fn insert_class(&self, class: &Class) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO classes(class_id, teacher_id, class_name, description, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                class.class_id,
                class.teacher_id,
                class.class_name,
                class.description,
                class.created_at,
                class.updated_at,
            ],
        )?;
        Ok(())
    }

    fn classes_for_teacher(&self, teacher_id: &str) -> Result<Vec<Class>, StoreError> {
        let sql = format!(
            "SELECT {CLASS_COLS} FROM classes WHERE teacher_id = ?
             ORDER BY created_at DESC, class_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([teacher_id], class_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn classes_by_ids(&self, class_ids: &[String]) -> Result<Vec<Class>, StoreError> {
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; class_ids.len()].join(", ");
        let sql = format!(
            "SELECT {CLASS_COLS} FROM classes
             WHERE class_id IN ({placeholders})
             ORDER BY created_at DESC, class_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<Value> = class_ids.iter().map(|id| Value::from(id.clone())).collect();
        let rows = stmt.query_map(params_from_iter(params), class_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update_class(
        &self,
        teacher_id: &str,
        class_id: &str,
        patch: &ClassPatch,
    ) -> Result<bool, StoreError> {
        // COALESCE keeps untouched fields; the WHERE clause scopes the write
        // to the owner so a foreign class simply matches zero rows.
        let rows = self.conn.execute(
            "UPDATE classes SET
               class_name = COALESCE(?, class_name),
               description = COALESCE(?, description),
               updated_at = ?
             WHERE class_id = ? AND teacher_id = ?",
            rusqlite::params![
                patch.class_name,
                patch.description,
                Utc::now(),
                class_id,
                teacher_id,
            ],
        )?;
        Ok(rows > 0)
    }

    fn delete_class(&self, teacher_id: &str, class_id: &str) -> Result<bool, StoreError> {
        if !self.class_owned_by(class_id, teacher_id)? {
            return Ok(false);
        }

        let tx = self.conn.unchecked_transaction()?;
        // Dependents first; reports keep their informational assignment link.
        tx.execute("DELETE FROM class_members WHERE class_id = ?", [class_id])?;
        tx.execute("DELETE FROM assignments WHERE class_id = ?", [class_id])?;
        let rows = tx.execute(
            "DELETE FROM classes WHERE class_id = ? AND teacher_id = ?",
            [class_id, teacher_id],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    fn class_owned_by(&self, class_id: &str, teacher_id: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM classes WHERE class_id = ? AND teacher_id = ?",
                [class_id, teacher_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_member(
        &self,
        class_id: &str,
        student_id: &str,
    ) -> Result<MemberInsert, StoreError> {
        // OR IGNORE rides on the (class_id, student_id) primary key, so a
        // retried add is absorbed here rather than deduplicated client-side.
        let rows = self.conn.execute(
            "INSERT OR IGNORE INTO class_members(class_id, student_id, joined_at)
             VALUES(?, ?, ?)",
            rusqlite::params![class_id, student_id, Utc::now()],
        )?;
        Ok(if rows > 0 {
            MemberInsert::Inserted
        } else {
            MemberInsert::AlreadyEnrolled
        })
    }

    fn delete_member(&self, class_id: &str, student_id: &str) -> Result<bool, StoreError> {
        let rows = self.conn.execute(
            "DELETE FROM class_members WHERE class_id = ? AND student_id = ?",
            [class_id, student_id],
        )?;
        Ok(rows > 0)
    }

    fn member_student_ids(&self, class_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT student_id FROM class_members WHERE class_id = ?")?;
        let rows = stmt.query_map([class_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn class_ids_for_student(&self, student_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT class_id FROM class_members WHERE student_id = ?")?;
        let rows = stmt.query_map([student_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO assignments(assignment_id, class_id, title, description, scenario_id,
                                     due_date, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                assignment.assignment_id,
                assignment.class_id,
                assignment.title,
                assignment.description,
                assignment.scenario_id,
                assignment.due_date,
                assignment.created_at,
                assignment.updated_at,
            ],
        )?;
        Ok(())
    }

    fn assignments_for_class(&self, class_id: &str) -> Result<Vec<Assignment>, StoreError> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLS} FROM assignments WHERE class_id = ?
             ORDER BY created_at DESC, assignment_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([class_id], assignment_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn assignments_for_classes(
        &self,
        class_ids: &[String],
    ) -> Result<Vec<Assignment>, StoreError> {
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; class_ids.len()].join(", ");
        let sql = format!(
            "SELECT {ASSIGNMENT_COLS} FROM assignments
             WHERE class_id IN ({placeholders})
             ORDER BY created_at DESC, assignment_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<Value> = class_ids.iter().map(|id| Value::from(id.clone())).collect();
        let rows = stmt.query_map(params_from_iter(params), assignment_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl ReportStore for SqliteStore {
    fn insert_report(&self, report: &SessionReport) -> Result<(), StoreError> {
        let vocabulary = serde_json::to_string(&report.vocabulary_used)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let improvements = serde_json::to_string(&report.improvements)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let achievements = serde_json::to_string(&report.achievements)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO session_reports(report_id, student_id, assignment_id, companion_id,
                transcript, pronunciation_score, fluency_score, grammar_feedback,
                session_duration, tutor_type, topic, vocabulary_used, improvements,
                achievements, audio_url, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                report.report_id,
                report.student_id,
                report.assignment_id,
                report.companion_id,
                report.transcript,
                report.pronunciation_score,
                report.fluency_score,
                report.grammar_feedback,
                report.session_duration,
                report.tutor_type.as_str(),
                report.topic,
                vocabulary,
                improvements,
                achievements,
                report.audio_url,
                report.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_report(
        &self,
        student_id: &str,
        report_id: &str,
    ) -> Result<Option<SessionReport>, StoreError> {
        // Ownership is part of the lookup key; a foreign report is
        // indistinguishable from a missing one.
        let sql = format!(
            "SELECT {REPORT_COLS} FROM session_reports
             WHERE report_id = ? AND student_id = ?"
        );
        Ok(self
            .conn
            .query_row(&sql, [report_id, student_id], report_from_row)
            .optional()?)
    }

    fn list_reports(
        &self,
        student_id: &str,
        limit: u32,
    ) -> Result<Vec<SessionReport>, StoreError> {
        let sql = format!(
            "SELECT {REPORT_COLS} FROM session_reports
             WHERE student_id = ?
             ORDER BY created_at DESC, report_id
             LIMIT ?"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params![student_id, limit],
            report_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn reports_for_student(&self, student_id: &str) -> Result<Vec<SessionReport>, StoreError> {
        let sql = format!("SELECT {REPORT_COLS} FROM session_reports WHERE student_id = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([student_id], report_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

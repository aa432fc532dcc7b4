use crate::error::StoreError;
use crate::model::{
    Assignment, Class, IdentityRecord, Profile, Role, SessionReport, StudentSummary,
};
pub mod sqlite;

/// Outcome of a membership insert. Duplicate enrollment is absorbed by the
/// store's uniqueness constraint, not by client-side dedup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberInsert {
    Inserted,
    AlreadyEnrolled,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub class_name: Option<String>,
    pub description: Option<String>,
}

pub trait ProfileStore {
    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;
    /// Inserts a fresh profile row; `Conflict` means one already exists.
    fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError>;
    /// Display fields only; `None` fields are left untouched. Returns false
    /// when no row matched.
    fn update_display(&self, user_id: &str, patch: &ProfilePatch) -> Result<bool, StoreError>;
    /// Overwrites all display fields, clearing the ones the patch leaves
    /// `None`. Used when mirroring a full provider record.
    fn replace_display(&self, user_id: &str, patch: &ProfilePatch) -> Result<bool, StoreError>;
    fn set_role(&self, user_id: &str, role: Role) -> Result<bool, StoreError>;
    fn list_students(&self, limit: u32, offset: u32) -> Result<Vec<StudentSummary>, StoreError>;
    /// Profiles for the given ids, restricted to the given role.
    fn profiles_with_role(&self, ids: &[String], role: Role) -> Result<Vec<Profile>, StoreError>;
    /// Upserts the local mirror of an identity-provider record.
    fn record_identity(&self, rec: &IdentityRecord) -> Result<(), StoreError>;
}

pub trait ClassStore {
    fn insert_class(&self, class: &Class) -> Result<(), StoreError>;
    fn classes_for_teacher(&self, teacher_id: &str) -> Result<Vec<Class>, StoreError>;
    /// Newest-first. Ids without a class row are silently skipped.
    fn classes_by_ids(&self, class_ids: &[String]) -> Result<Vec<Class>, StoreError>;
    /// Conditional write scoped by owner; false means not found or not owned.
    fn update_class(
        &self,
        teacher_id: &str,
        class_id: &str,
        patch: &ClassPatch,
    ) -> Result<bool, StoreError>;
    /// Deletes the class and its dependents atomically, scoped by owner.
    fn delete_class(&self, teacher_id: &str, class_id: &str) -> Result<bool, StoreError>;
    fn class_owned_by(&self, class_id: &str, teacher_id: &str) -> Result<bool, StoreError>;

    fn insert_member(&self, class_id: &str, student_id: &str)
        -> Result<MemberInsert, StoreError>;
    fn delete_member(&self, class_id: &str, student_id: &str) -> Result<bool, StoreError>;
    fn member_student_ids(&self, class_id: &str) -> Result<Vec<String>, StoreError>;
    fn class_ids_for_student(&self, student_id: &str) -> Result<Vec<String>, StoreError>;

    fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StoreError>;
    fn assignments_for_class(&self, class_id: &str) -> Result<Vec<Assignment>, StoreError>;
    /// Newest-first across all the given classes.
    fn assignments_for_classes(&self, class_ids: &[String])
        -> Result<Vec<Assignment>, StoreError>;
}

pub trait ReportStore {
    fn insert_report(&self, report: &SessionReport) -> Result<(), StoreError>;
    /// Ownership-scoped read; a foreign report is plain `None`.
    fn get_report(
        &self,
        student_id: &str,
        report_id: &str,
    ) -> Result<Option<SessionReport>, StoreError>;
    fn list_reports(&self, student_id: &str, limit: u32)
        -> Result<Vec<SessionReport>, StoreError>;
    /// Full history for aggregation.
    fn reports_for_student(&self, student_id: &str) -> Result<Vec<SessionReport>, StoreError>;
}

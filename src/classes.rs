use std::rc::Rc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::model::{Class, Profile, Role, StudentSummary};
use crate::store::{ClassPatch, ClassStore, ProfileStore};

const STUDENT_PAGE_DEFAULT: u32 = 50;
const STUDENT_PAGE_MAX: u32 = 200;

/// Teacher-owned classes and their student rosters. Every mutation is
/// scoped by the owning teacher; a foreign class behaves as missing.
pub struct ClassService {
    classes: Rc<dyn ClassStore>,
    profiles: Rc<dyn ProfileStore>,
}

impl ClassService {
    pub fn new(classes: Rc<dyn ClassStore>, profiles: Rc<dyn ProfileStore>) -> Self {
        Self { classes, profiles }
    }

    pub fn create_class(
        &self,
        teacher_id: &str,
        class_name: &str,
        description: Option<String>,
    ) -> ServiceResult<Class> {
        let class_name = class_name.trim();
        if class_name.is_empty() {
            return Err(ServiceError::Validation(
                "class name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let class = Class {
            class_id: Uuid::new_v4().to_string(),
            teacher_id: teacher_id.to_string(),
            class_name: class_name.to_string(),
            description,
            created_at: now,
            updated_at: now,
        };
        self.classes.insert_class(&class)?;
        Ok(class)
    }

    /// Newest-first. Degrades to an empty list on store failure.
    pub fn list_classes_for_teacher(&self, teacher_id: &str) -> Vec<Class> {
        match self.classes.classes_for_teacher(teacher_id) {
            Ok(classes) => classes,
            Err(e) => {
                tracing::warn!(teacher_id, "class listing failed: {e}");
                Vec::new()
            }
        }
    }

    /// The classes the student is enrolled in, newest-first. No memberships
    /// means an empty list, not an error.
    pub fn list_classes_for_student(&self, student_id: &str) -> Vec<Class> {
        let listing = || -> ServiceResult<Vec<Class>> {
            let class_ids = self.classes.class_ids_for_student(student_id)?;
            if class_ids.is_empty() {
                return Ok(Vec::new());
            }
            Ok(self.classes.classes_by_ids(&class_ids)?)
        };
        match listing() {
            Ok(classes) => classes,
            Err(e) => {
                tracing::warn!(student_id, "student class listing failed: {e}");
                Vec::new()
            }
        }
    }

    /// Returns false when the class does not exist or is not owned by the
    /// caller; the two cases are indistinguishable by design.
    pub fn update_class(
        &self,
        teacher_id: &str,
        class_id: &str,
        patch: &ClassPatch,
    ) -> ServiceResult<bool> {
        if let Some(name) = &patch.class_name {
            if name.trim().is_empty() {
                return Err(ServiceError::Validation(
                    "class name must not be empty".to_string(),
                ));
            }
        }
        Ok(self.classes.update_class(teacher_id, class_id, patch)?)
    }

    pub fn delete_class(&self, teacher_id: &str, class_id: &str) -> ServiceResult<bool> {
        Ok(self.classes.delete_class(teacher_id, class_id)?)
    }

    /// Ownership is checked before the roster write. The membership key
    /// makes a retried add idempotent.
    pub fn add_student_to_class(
        &self,
        teacher_id: &str,
        class_id: &str,
        student_id: &str,
    ) -> ServiceResult<()> {
        if !self.classes.class_owned_by(class_id, teacher_id)? {
            return Err(ServiceError::NotFound);
        }
        self.classes.insert_member(class_id, student_id)?;
        Ok(())
    }

    /// Removing a non-member is a silent no-op.
    pub fn remove_student_from_class(
        &self,
        teacher_id: &str,
        class_id: &str,
        student_id: &str,
    ) -> ServiceResult<()> {
        if !self.classes.class_owned_by(class_id, teacher_id)? {
            return Err(ServiceError::NotFound);
        }
        self.classes.delete_member(class_id, student_id)?;
        Ok(())
    }

    /// Empty for a class the caller does not own, so class existence never
    /// leaks through the roster.
    pub fn list_members(&self, teacher_id: &str, class_id: &str) -> Vec<Profile> {
        let listing = || -> ServiceResult<Vec<Profile>> {
            if !self.classes.class_owned_by(class_id, teacher_id)? {
                return Ok(Vec::new());
            }
            let ids = self.classes.member_student_ids(class_id)?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            Ok(self.profiles.profiles_with_role(&ids, Role::Student)?)
        };
        match listing() {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(class_id, "member listing failed: {e}");
                Vec::new()
            }
        }
    }

    /// Paginated student directory, trimmed to name fields.
    pub fn list_all_students(&self, limit: Option<u32>, offset: u32) -> Vec<StudentSummary> {
        let limit = limit
            .unwrap_or(STUDENT_PAGE_DEFAULT)
            .min(STUDENT_PAGE_MAX)
            .max(1);
        match self.profiles.list_students(limit, offset) {
            Ok(students) => students,
            Err(e) => {
                tracing::warn!("student listing failed: {e}");
                Vec::new()
            }
        }
    }
}

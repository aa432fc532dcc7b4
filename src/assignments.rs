use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::model::{Assignment, AssignmentStatus};
use crate::store::ClassStore;

/// Read-time urgency: overdue only when a due date exists and has passed.
pub fn classify_due_date(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> AssignmentStatus {
    match due_date {
        Some(due) if due < now => AssignmentStatus::Overdue,
        _ => AssignmentStatus::Active,
    }
}

/// Assignment plus its urgency as seen from "now". The status is derived on
/// every read and never stored.
#[derive(Debug, Clone, Serialize)]
pub struct StudentAssignment {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub status: AssignmentStatus,
}

pub struct AssignmentService {
    classes: Rc<dyn ClassStore>,
}

impl AssignmentService {
    pub fn new(classes: Rc<dyn ClassStore>) -> Self {
        Self { classes }
    }

    pub fn create_assignment(
        &self,
        teacher_id: &str,
        class_id: &str,
        title: &str,
        description: Option<String>,
        scenario_id: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> ServiceResult<Assignment> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::Validation(
                "assignment title must not be empty".to_string(),
            ));
        }
        if !self.classes.class_owned_by(class_id, teacher_id)? {
            return Err(ServiceError::NotFound);
        }

        let now = Utc::now();
        let assignment = Assignment {
            assignment_id: Uuid::new_v4().to_string(),
            class_id: class_id.to_string(),
            title: title.to_string(),
            description,
            scenario_id,
            due_date,
            created_at: now,
            updated_at: now,
        };
        self.classes.insert_assignment(&assignment)?;
        Ok(assignment)
    }

    /// Empty when the class is not owned by the caller.
    pub fn list_for_class(&self, teacher_id: &str, class_id: &str) -> Vec<Assignment> {
        let listing = || -> ServiceResult<Vec<Assignment>> {
            if !self.classes.class_owned_by(class_id, teacher_id)? {
                return Ok(Vec::new());
            }
            Ok(self.classes.assignments_for_class(class_id)?)
        };
        match listing() {
            Ok(assignments) => assignments,
            Err(e) => {
                tracing::warn!(class_id, "assignment listing failed: {e}");
                Vec::new()
            }
        }
    }

    /// Assignments of every class the student belongs to, newest-first,
    /// each tagged with its current urgency. No memberships means an empty
    /// list, not an error.
    pub fn list_for_student(&self, student_id: &str) -> Vec<StudentAssignment> {
        let listing = || -> ServiceResult<Vec<StudentAssignment>> {
            let class_ids = self.classes.class_ids_for_student(student_id)?;
            if class_ids.is_empty() {
                return Ok(Vec::new());
            }
            let now = Utc::now();
            Ok(self
                .classes
                .assignments_for_classes(&class_ids)?
                .into_iter()
                .map(|assignment| StudentAssignment {
                    status: classify_due_date(assignment.due_date, now),
                    assignment,
                })
                .collect())
        };
        match listing() {
            Ok(assignments) => assignments,
            Err(e) => {
                tracing::warn!(student_id, "student assignment listing failed: {e}");
                Vec::new()
            }
        }
    }
}

//! Student↔Course associations
//!
//! Enrollment records are the only place the association lives; the course
//! list of a student (and the roster of a course) is always computed by
//! lookup.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, Entity, Result};
use crate::model::{Course, Enrollment, Student};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct Enrollments {
    store: Arc<dyn DocumentStore>,
}

impl Enrollments {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Both ends are resolved in order, student first, so the error names
    /// the first missing entity.
    async fn resolve_pair(&self, student_id: Uuid, course_id: Uuid) -> Result<(Student, Course)> {
        let student = self
            .store
            .find_student(student_id)
            .await?
            .ok_or(ApiError::NotFound(Entity::Student))?;
        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or(ApiError::NotFound(Entity::Course))?;
        Ok((student, course))
    }

    /// Enroll a student in a course. Enrolling an already enrolled pair is a
    /// no-op that still succeeds.
    ///
    /// The existence check and the insert are separate store calls.
    pub async fn enroll(&self, student_id: Uuid, course_id: Uuid) -> Result<Student> {
        let (student, _) = self.resolve_pair(student_id, course_id).await?;

        if self.store.find_enrollment(student_id, course_id).await?.is_some() {
            debug!(%student_id, %course_id, "already enrolled");
            return Ok(student);
        }

        let enrollment = Enrollment {
            id: Uuid::now_v7(),
            student_id,
            course_id,
        };
        self.store.insert_enrollment(&enrollment).await?;
        debug!(%student_id, %course_id, enrollment_id = %enrollment.id, "enrolled");
        Ok(student)
    }

    pub async fn unenroll(&self, student_id: Uuid, course_id: Uuid) -> Result<Student> {
        let (student, _) = self.resolve_pair(student_id, course_id).await?;

        if self.store.find_enrollment(student_id, course_id).await?.is_none() {
            return Err(ApiError::NotEnrolled);
        }
        // A concurrent unenroll may have won between the lookup and here.
        if !self.store.delete_enrollment(student_id, course_id).await? {
            return Err(ApiError::NotEnrolled);
        }
        debug!(%student_id, %course_id, "unenrolled");
        Ok(student)
    }

    /// Courses a student is enrolled in: one enrollment lookup, then one
    /// batch fetch of the collected course ids.
    pub async fn courses_of(&self, student_id: Uuid) -> Result<Vec<Course>> {
        let ids = self.course_ids_of(student_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.find_courses_by_ids(&ids).await?)
    }

    /// Students enrolled in a course: one enrollment lookup, then one batch
    /// fetch of the collected student ids.
    pub async fn students_of(&self, course_id: Uuid) -> Result<Vec<Student>> {
        let ids = self.student_ids_of(course_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.find_students_by_ids(&ids).await?)
    }

    pub async fn course_ids_of(&self, student_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = self.store.enrollments_of_student(student_id).await?;
        Ok(rows.into_iter().map(|e| e.course_id).collect())
    }

    pub async fn student_ids_of(&self, course_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = self.store.enrollments_of_course(course_id).await?;
        Ok(rows.into_iter().map(|e| e.student_id).collect())
    }

    pub async fn courses_count_of(&self, student_id: Uuid) -> Result<u64> {
        Ok(self.store.count_enrollments_of_student(student_id).await?)
    }

    pub async fn students_count_of(&self, course_id: Uuid) -> Result<u64> {
        Ok(self.store.count_enrollments_of_course(course_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::model::{CreateCourseInput, CreateStudentInput};
    use crate::store::InMemoryStore;

    struct Fixture {
        store: Arc<InMemoryStore>,
        catalog: Catalog,
        enrollments: Enrollments,
        ana: Student,
        algorithms: Course,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let catalog = Catalog::new(store.clone());
        let enrollments = Enrollments::new(store.clone());
        let ana = catalog
            .create_student(CreateStudentInput {
                name: "Ana".into(),
                email: "ana@x.com".into(),
                age: 20,
                major: "CS".into(),
            })
            .await
            .unwrap();
        let algorithms = catalog
            .create_course(CreateCourseInput {
                title: "Algorithms".into(),
                code: "CS301".into(),
                credits: 4,
                instructor: "Dr. K".into(),
            })
            .await
            .unwrap();
        Fixture {
            store,
            catalog,
            enrollments,
            ana,
            algorithms,
        }
    }

    #[tokio::test]
    async fn enroll_then_query_both_sides() {
        let f = fixture().await;
        let student = f.enrollments.enroll(f.ana.id, f.algorithms.id).await.unwrap();
        assert_eq!(student, f.ana);

        let courses = f.enrollments.courses_of(f.ana.id).await.unwrap();
        assert_eq!(courses, vec![f.algorithms.clone()]);
        let students = f.enrollments.students_of(f.algorithms.id).await.unwrap();
        assert_eq!(students, vec![f.ana.clone()]);
        assert_eq!(f.enrollments.students_count_of(f.algorithms.id).await.unwrap(), 1);
        assert_eq!(f.enrollments.courses_count_of(f.ana.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn enroll_is_idempotent() {
        let f = fixture().await;
        f.enrollments.enroll(f.ana.id, f.algorithms.id).await.unwrap();
        f.enrollments.enroll(f.ana.id, f.algorithms.id).await.unwrap();

        let rows = f.store.enrollments_of_student(f.ana.id).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn enroll_reports_which_side_is_missing() {
        let f = fixture().await;
        let err = f
            .enrollments
            .enroll(Uuid::now_v7(), f.algorithms.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(Entity::Student)));

        let err = f.enrollments.enroll(f.ana.id, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(Entity::Course)));

        // Both missing: the student is checked first.
        let err = f
            .enrollments
            .enroll(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(Entity::Student)));
        assert_eq!(f.enrollments.courses_count_of(f.ana.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unenroll_requires_enrollment() {
        let f = fixture().await;
        let err = f
            .enrollments
            .unenroll(f.ana.id, f.algorithms.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotEnrolled));

        f.enrollments.enroll(f.ana.id, f.algorithms.id).await.unwrap();
        f.enrollments.unenroll(f.ana.id, f.algorithms.id).await.unwrap();

        let err = f
            .enrollments
            .unenroll(f.ana.id, f.algorithms.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotEnrolled));
    }

    #[tokio::test]
    async fn unenroll_missing_entity_is_not_found() {
        let f = fixture().await;
        let err = f
            .enrollments
            .unenroll(f.ana.id, Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(Entity::Course)));
    }

    #[tokio::test]
    async fn deleting_student_cascades() {
        let f = fixture().await;
        f.enrollments.enroll(f.ana.id, f.algorithms.id).await.unwrap();

        f.catalog.delete_student(f.ana.id).await.unwrap();
        assert!(f.enrollments.courses_of(f.ana.id).await.unwrap().is_empty());
        assert_eq!(f.enrollments.students_count_of(f.algorithms.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_course_cascades() {
        let f = fixture().await;
        f.enrollments.enroll(f.ana.id, f.algorithms.id).await.unwrap();

        f.catalog.delete_course(f.algorithms.id).await.unwrap();
        assert_eq!(f.enrollments.courses_count_of(f.ana.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn orphans_from_failed_cascade_are_skipped_but_counted() {
        let f = fixture().await;
        f.enrollments.enroll(f.ana.id, f.algorithms.id).await.unwrap();

        f.store.fail_cascades();
        f.catalog.delete_student(f.ana.id).await.unwrap();

        assert!(f.enrollments.students_of(f.algorithms.id).await.unwrap().is_empty());
        assert_eq!(f.enrollments.students_count_of(f.algorithms.id).await.unwrap(), 1);
    }
}

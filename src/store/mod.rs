//! Document-store interface
//!
//! Everything the API persists goes through [`DocumentStore`]: four
//! collections (students, courses, enrollments, users) keyed by an opaque
//! [`Uuid`]. The trait carries no transactions; multi-step writes such as a
//! delete followed by its enrollment cascade are separate calls.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Course, CourseFilter, Enrollment, Student, StudentFilter, User};
use crate::pagination::{CourseSort, Page, StudentSort};

pub mod memory;

pub use memory::InMemoryStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Filtered, sorted window over the students collection.
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    pub filter: StudentFilter,
    pub page: Page<StudentSort>,
}

/// Filtered, sorted window over the courses collection.
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    pub filter: CourseFilter,
    pub page: Page<CourseSort>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ── students ──
    async fn insert_student(&self, student: &Student) -> StoreResult<()>;
    async fn find_student(&self, id: Uuid) -> StoreResult<Option<Student>>;
    /// Case-insensitive lookup.
    async fn find_student_by_email(&self, email: &str) -> StoreResult<Option<Student>>;
    async fn find_students(&self, query: &StudentQuery) -> StoreResult<Vec<Student>>;
    /// Missing ids are skipped.
    async fn find_students_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Student>>;
    /// Case-insensitive substring match on major, sorted by name.
    async fn find_students_by_major(&self, major: &str) -> StoreResult<Vec<Student>>;
    /// Returns `false` when no record has that id.
    async fn replace_student(&self, student: &Student) -> StoreResult<bool>;
    async fn delete_student(&self, id: Uuid) -> StoreResult<Option<Student>>;

    // ── courses ──
    async fn insert_course(&self, course: &Course) -> StoreResult<()>;
    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>>;
    /// Case-insensitive lookup.
    async fn find_course_by_code(&self, code: &str) -> StoreResult<Option<Course>>;
    async fn find_courses(&self, query: &CourseQuery) -> StoreResult<Vec<Course>>;
    /// Missing ids are skipped.
    async fn find_courses_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Course>>;
    async fn replace_course(&self, course: &Course) -> StoreResult<bool>;
    async fn delete_course(&self, id: Uuid) -> StoreResult<Option<Course>>;

    // ── enrollments ──
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> StoreResult<()>;
    async fn find_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<Enrollment>>;
    async fn enrollments_of_student(&self, student_id: Uuid) -> StoreResult<Vec<Enrollment>>;
    async fn enrollments_of_course(&self, course_id: Uuid) -> StoreResult<Vec<Enrollment>>;
    async fn count_enrollments_of_student(&self, student_id: Uuid) -> StoreResult<u64>;
    async fn count_enrollments_of_course(&self, course_id: Uuid) -> StoreResult<u64>;
    /// Removes at most one record. Returns whether one was removed.
    async fn delete_enrollment(&self, student_id: Uuid, course_id: Uuid) -> StoreResult<bool>;
    /// Returns the number of records removed.
    async fn delete_enrollments_of_student(&self, student_id: Uuid) -> StoreResult<u64>;
    async fn delete_enrollments_of_course(&self, course_id: Uuid) -> StoreResult<u64>;

    // ── users ──
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

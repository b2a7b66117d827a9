//! Typed access to students, courses and users
//!
//! Validation and uniqueness checks run before any write. Uniqueness is a
//! lookup immediately ahead of the insert, not a transaction: two concurrent
//! creates with the same email (or course code) can both pass the check.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, Entity, Result};
use crate::model::{
    CreateCourseInput, CreateStudentInput, Course, Student, UpdateCourseInput,
    UpdateStudentInput, User,
};
use crate::store::{CourseQuery, DocumentStore, StudentQuery};

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ── students ────────────────────────────────────────────────────────────

    pub async fn find_students(&self, query: &StudentQuery) -> Result<Vec<Student>> {
        debug!(?query, "find students");
        Ok(self.store.find_students(query).await?)
    }

    pub async fn find_students_by_major(&self, major: &str) -> Result<Vec<Student>> {
        Ok(self.store.find_students_by_major(major).await?)
    }

    pub async fn find_students_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Student>> {
        Ok(self.store.find_students_by_ids(ids).await?)
    }

    pub async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self.store.find_student(id).await?)
    }

    pub async fn create_student(&self, input: CreateStudentInput) -> Result<Student> {
        input.validate()?;
        let email = input.email.to_lowercase();
        if self.store.find_student_by_email(&email).await?.is_some() {
            return Err(ApiError::AlreadyExists("Email already in use".into()));
        }

        let student = Student {
            id: Uuid::now_v7(),
            name: input.name,
            email,
            age: input.age,
            major: input.major,
        };
        self.store.insert_student(&student).await?;
        debug!(student_id = %student.id, "student created");
        Ok(student)
    }

    pub async fn update_student(&self, id: Uuid, input: UpdateStudentInput) -> Result<Student> {
        input.validate()?;
        let mut student = self
            .store
            .find_student(id)
            .await?
            .ok_or(ApiError::NotFound(Entity::Student))?;

        if let Some(email) = &input.email {
            if let Some(other) = self.store.find_student_by_email(email).await? {
                if other.id != id {
                    return Err(ApiError::AlreadyExists("Email already in use".into()));
                }
            }
        }

        input.apply(&mut student);
        if !self.store.replace_student(&student).await? {
            return Err(ApiError::NotFound(Entity::Student));
        }
        Ok(student)
    }

    /// Delete a student and then its enrollments.
    ///
    /// Returns `None` when the id does not resolve. A failure while removing
    /// the enrollments is logged and leaves them orphaned; the student stays
    /// deleted.
    pub async fn delete_student(&self, id: Uuid) -> Result<Option<Student>> {
        let Some(student) = self.store.delete_student(id).await? else {
            return Ok(None);
        };
        match self.store.delete_enrollments_of_student(id).await {
            Ok(removed) => debug!(student_id = %id, removed, "student enrollments removed"),
            Err(e) => warn!(
                student_id = %id,
                error = %e,
                "student deleted but enrollment cleanup failed; enrollments orphaned"
            ),
        }
        Ok(Some(student))
    }

    // ── courses ─────────────────────────────────────────────────────────────

    pub async fn find_courses(&self, query: &CourseQuery) -> Result<Vec<Course>> {
        debug!(?query, "find courses");
        Ok(self.store.find_courses(query).await?)
    }

    pub async fn find_courses_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>> {
        Ok(self.store.find_courses_by_ids(ids).await?)
    }

    pub async fn find_course_by_id(&self, id: Uuid) -> Result<Option<Course>> {
        Ok(self.store.find_course(id).await?)
    }

    pub async fn create_course(&self, input: CreateCourseInput) -> Result<Course> {
        input.validate()?;
        if self.store.find_course_by_code(&input.code).await?.is_some() {
            return Err(ApiError::AlreadyExists("Course code already exists".into()));
        }

        let course = Course {
            id: Uuid::now_v7(),
            title: input.title,
            code: input.code,
            credits: input.credits,
            instructor: input.instructor,
        };
        self.store.insert_course(&course).await?;
        debug!(course_id = %course.id, "course created");
        Ok(course)
    }

    pub async fn update_course(&self, id: Uuid, input: UpdateCourseInput) -> Result<Course> {
        input.validate()?;
        let mut course = self
            .store
            .find_course(id)
            .await?
            .ok_or(ApiError::NotFound(Entity::Course))?;

        if let Some(code) = &input.code {
            if let Some(other) = self.store.find_course_by_code(code).await? {
                if other.id != id {
                    return Err(ApiError::AlreadyExists("Course code already exists".into()));
                }
            }
        }

        input.apply(&mut course);
        if !self.store.replace_course(&course).await? {
            return Err(ApiError::NotFound(Entity::Course));
        }
        Ok(course)
    }

    /// Delete a course and then its enrollments. Same cascade rules as
    /// [`Catalog::delete_student`].
    pub async fn delete_course(&self, id: Uuid) -> Result<Option<Course>> {
        let Some(course) = self.store.delete_course(id).await? else {
            return Ok(None);
        };
        match self.store.delete_enrollments_of_course(id).await {
            Ok(removed) => debug!(course_id = %id, removed, "course enrollments removed"),
            Err(e) => warn!(
                course_id = %id,
                error = %e,
                "course deleted but enrollment cleanup failed; enrollments orphaned"
            ),
        }
        Ok(Some(course))
    }

    // ── users ───────────────────────────────────────────────────────────────

    pub async fn create_user(&self, email: &str, password_hash: String) -> Result<User> {
        let user = User {
            id: Uuid::now_v7(),
            email: email.to_lowercase(),
            password_hash,
        };
        self.store.insert_user(&user).await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.store.find_user_by_email(email).await?)
    }
}

//! Records, GraphQL inputs and field validation

use std::sync::LazyLock;

use async_graphql::InputObject;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, Result};

/// Youngest age accepted for a student.
pub const MIN_STUDENT_AGE: i32 = 16;

/// Inclusive credit range for a course.
pub const CREDIT_RANGE: std::ops::RangeInclusive<i32> = 1..=6;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    /// Always stored lower-cased.
    pub email: String,
    pub age: i32,
    pub major: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub credits: i32,
    pub instructor: String,
}

/// One Student↔Course association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
}

/// Auth principal. Only the salted hash of the password is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(InputObject, Debug, Clone)]
pub struct CreateStudentInput {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub major: String,
}

#[derive(InputObject, Debug, Clone, Default)]
pub struct UpdateStudentInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub major: Option<String>,
}

#[derive(InputObject, Debug, Clone)]
pub struct CreateCourseInput {
    pub title: String,
    pub code: String,
    pub credits: i32,
    pub instructor: String,
}

#[derive(InputObject, Debug, Clone, Default)]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub code: Option<String>,
    pub credits: Option<i32>,
    pub instructor: Option<String>,
}

#[derive(InputObject, Debug, Clone)]
#[graphql(name = "createUserInput")]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
}

/// Conjunction of student predicates; absent fields do not constrain.
#[derive(InputObject, Debug, Clone, Default)]
pub struct StudentFilter {
    /// Exact match.
    pub major: Option<String>,
    /// Case-insensitive substring.
    pub name_contains: Option<String>,
    /// Case-insensitive substring.
    pub email_contains: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

impl StudentFilter {
    pub fn matches(&self, student: &Student) -> bool {
        self.major.as_ref().map_or(true, |m| &student.major == m)
            && self
                .name_contains
                .as_deref()
                .map_or(true, |needle| contains_ignore_case(&student.name, needle))
            && self
                .email_contains
                .as_deref()
                .map_or(true, |needle| contains_ignore_case(&student.email, needle))
            && self.min_age.map_or(true, |min| student.age >= min)
            && self.max_age.map_or(true, |max| student.age <= max)
    }
}

/// Conjunction of course predicates; absent fields do not constrain.
#[derive(InputObject, Debug, Clone, Default)]
pub struct CourseFilter {
    /// Case-insensitive, anchored at the start of the code.
    pub code_prefix: Option<String>,
    /// Case-insensitive substring.
    pub title_contains: Option<String>,
    /// Exact match.
    pub instructor: Option<String>,
    pub min_credits: Option<i32>,
    pub max_credits: Option<i32>,
}

impl CourseFilter {
    pub fn matches(&self, course: &Course) -> bool {
        self.code_prefix
            .as_deref()
            .map_or(true, |prefix| starts_with_ignore_case(&course.code, prefix))
            && self
                .title_contains
                .as_deref()
                .map_or(true, |needle| contains_ignore_case(&course.title, needle))
            && self.instructor.as_ref().map_or(true, |i| &course.instructor == i)
            && self.min_credits.map_or(true, |min| course.credits >= min)
            && self.max_credits.map_or(true, |max| course.credits <= max)
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.to_lowercase().starts_with(&prefix.to_lowercase())
}

// ── Validation ──────────────────────────────────────────────────────────────

pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_SHAPE.is_match(email) {
        Ok(())
    } else {
        Err(ApiError::invalid("Invalid email format"))
    }
}

pub fn validate_age(age: i32) -> Result<()> {
    if age < MIN_STUDENT_AGE {
        return Err(ApiError::invalid(format!(
            "Student must be at least {MIN_STUDENT_AGE} years old"
        )));
    }
    Ok(())
}

pub fn validate_credits(credits: i32) -> Result<()> {
    if !CREDIT_RANGE.contains(&credits) {
        return Err(ApiError::invalid(format!(
            "Credits must be between {} and {}",
            CREDIT_RANGE.start(),
            CREDIT_RANGE.end()
        )));
    }
    Ok(())
}

fn validate_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{field} is required")));
    }
    Ok(())
}

impl CreateStudentInput {
    pub fn validate(&self) -> Result<()> {
        validate_non_empty("Student name", &self.name)?;
        validate_email(&self.email)?;
        validate_age(self.age)
    }
}

impl UpdateStudentInput {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_non_empty("Student name", name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        Ok(())
    }

    /// Apply only the supplied fields.
    pub fn apply(self, student: &mut Student) {
        if let Some(name) = self.name {
            student.name = name;
        }
        if let Some(email) = self.email {
            student.email = email.to_lowercase();
        }
        if let Some(age) = self.age {
            student.age = age;
        }
        if let Some(major) = self.major {
            student.major = major;
        }
    }
}

impl CreateCourseInput {
    pub fn validate(&self) -> Result<()> {
        validate_non_empty("Course code", &self.code)?;
        validate_credits(self.credits)
    }
}

impl UpdateCourseInput {
    pub fn validate(&self) -> Result<()> {
        if let Some(code) = &self.code {
            validate_non_empty("Course code", code)?;
        }
        if let Some(credits) = self.credits {
            validate_credits(credits)?;
        }
        Ok(())
    }

    /// Apply only the supplied fields.
    pub fn apply(self, course: &mut Course) {
        if let Some(title) = self.title {
            course.title = title;
        }
        if let Some(code) = self.code {
            course.code = code;
        }
        if let Some(credits) = self.credits {
            course.credits = credits;
        }
        if let Some(instructor) = self.instructor {
            course.instructor = instructor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> Student {
        Student {
            id: Uuid::now_v7(),
            name: "Ana".into(),
            email: "ana@x.com".into(),
            age: 20,
            major: "CS".into(),
        }
    }

    #[test]
    fn age_boundary() {
        assert!(matches!(validate_age(15), Err(ApiError::InvalidInput(_))));
        assert!(validate_age(16).is_ok());
    }

    #[test]
    fn credits_boundary() {
        assert!(validate_credits(0).is_err());
        assert!(validate_credits(1).is_ok());
        assert!(validate_credits(6).is_ok());
        assert!(matches!(validate_credits(7), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("ana@x.com").is_ok());
        assert!(validate_email("ana@x").is_err());
        assert!(validate_email("ana x@y.com").is_err());
        assert!(validate_email("@y.com").is_err());
    }

    #[test]
    fn blank_course_code_rejected() {
        let input = CreateCourseInput {
            title: "Algorithms".into(),
            code: "   ".into(),
            credits: 4,
            instructor: "Dr. K".into(),
        };
        assert!(matches!(input.validate(), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn student_filter_is_a_conjunction() {
        let student = ana();
        let filter = StudentFilter {
            major: Some("CS".into()),
            name_contains: Some("AN".into()),
            min_age: Some(18),
            ..Default::default()
        };
        assert!(filter.matches(&student));

        let filter = StudentFilter {
            major: Some("cs".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&student), "major is an exact match");

        let filter = StudentFilter {
            max_age: Some(19),
            ..Default::default()
        };
        assert!(!filter.matches(&student));
    }

    #[test]
    fn course_code_prefix_is_anchored() {
        let course = Course {
            id: Uuid::now_v7(),
            title: "Algorithms".into(),
            code: "CS301".into(),
            credits: 4,
            instructor: "Dr. K".into(),
        };
        let prefix = |p: &str| CourseFilter {
            code_prefix: Some(p.into()),
            ..Default::default()
        };
        assert!(prefix("cs3").matches(&course));
        assert!(!prefix("301").matches(&course));
    }

    #[test]
    fn update_applies_only_supplied_fields() {
        let mut student = ana();
        UpdateStudentInput {
            email: Some("ANA@Y.COM".into()),
            ..Default::default()
        }
        .apply(&mut student);
        assert_eq!(student.email, "ana@y.com");
        assert_eq!(student.name, "Ana");
        assert_eq!(student.age, 20);
    }
}

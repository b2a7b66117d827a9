//! In-process document store

use std::cmp::Ordering;
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CourseQuery, DocumentStore, StoreResult, StudentQuery};
#[cfg(test)]
use crate::error::StoreError;
use crate::model::{contains_ignore_case, Course, Enrollment, Student, User};
use crate::pagination::{CourseSort, Page, SortOrder, StudentSort};

#[derive(Default)]
struct Collections {
    students: HashMap<Uuid, Student>,
    courses: HashMap<Uuid, Course>,
    enrollments: HashMap<Uuid, Enrollment>,
    users: HashMap<Uuid, User>,
}

/// Collections held in memory behind a single lock.
///
/// Each call takes the lock once, so every individual operation is atomic
/// but nothing spans calls.
#[derive(Default)]
pub struct InMemoryStore {
    data: RwLock<Collections>,
    #[cfg(test)]
    fail_cascades: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the bulk enrollment deletes fail, leaving everything else intact.
    #[cfg(test)]
    pub(crate) fn fail_cascades(&self) {
        self.fail_cascades.store(true, AtomicOrdering::SeqCst);
    }

    #[cfg(test)]
    fn check_cascade(&self) -> StoreResult<()> {
        if self.fail_cascades.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("injected cascade failure".into()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn check_cascade(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Sort by key, then by id so equal keys keep creation order (ids are v7).
fn window<T: Clone>(
    mut rows: Vec<&T>,
    page: Page<impl Copy>,
    cmp_key: impl Fn(&T, &T) -> Ordering,
    id: impl Fn(&T) -> Uuid,
) -> Vec<T> {
    rows.sort_by(|a, b| {
        let by_key = match page.order {
            SortOrder::Asc => cmp_key(*a, *b),
            SortOrder::Desc => cmp_key(*b, *a),
        };
        by_key.then_with(|| id(*a).cmp(&id(*b)))
    });
    rows.into_iter()
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect()
}

fn student_key(sort: StudentSort) -> impl Fn(&Student, &Student) -> Ordering {
    move |a, b| match sort {
        StudentSort::Name => a.name.cmp(&b.name),
        StudentSort::Age => a.age.cmp(&b.age),
        StudentSort::Email => a.email.cmp(&b.email),
        StudentSort::Major => a.major.cmp(&b.major),
    }
}

fn course_key(sort: CourseSort) -> impl Fn(&Course, &Course) -> Ordering {
    move |a, b| match sort {
        CourseSort::Title => a.title.cmp(&b.title),
        CourseSort::Code => a.code.cmp(&b.code),
        CourseSort::Credits => a.credits.cmp(&b.credits),
        CourseSort::Instructor => a.instructor.cmp(&b.instructor),
    }
}

fn by_ids<T: Clone>(rows: &HashMap<Uuid, T>, ids: &[Uuid]) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| rows.get(id).cloned())
        .collect()
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_student(&self, student: &Student) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.students.insert(student.id, student.clone());
        Ok(())
    }

    async fn find_student(&self, id: Uuid) -> StoreResult<Option<Student>> {
        Ok(self.data.read().await.students.get(&id).cloned())
    }

    async fn find_student_by_email(&self, email: &str) -> StoreResult<Option<Student>> {
        let data = self.data.read().await;
        Ok(data
            .students
            .values()
            .find(|s| s.email.to_lowercase() == email.to_lowercase())
            .cloned())
    }

    async fn find_students(&self, query: &StudentQuery) -> StoreResult<Vec<Student>> {
        let data = self.data.read().await;
        let rows: Vec<&Student> = data
            .students
            .values()
            .filter(|s| query.filter.matches(s))
            .collect();
        Ok(window(rows, query.page, student_key(query.page.sort), |s: &Student| s.id))
    }

    async fn find_students_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Student>> {
        Ok(by_ids(&self.data.read().await.students, ids))
    }

    async fn find_students_by_major(&self, major: &str) -> StoreResult<Vec<Student>> {
        let data = self.data.read().await;
        let rows: Vec<&Student> = data
            .students
            .values()
            .filter(|s| contains_ignore_case(&s.major, major))
            .collect();
        let page = Page {
            limit: usize::MAX,
            ..Page::<StudentSort>::default()
        };
        Ok(window(rows, page, student_key(StudentSort::Name), |s: &Student| s.id))
    }

    async fn replace_student(&self, student: &Student) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        Ok(match data.students.get_mut(&student.id) {
            Some(slot) => {
                *slot = student.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_student(&self, id: Uuid) -> StoreResult<Option<Student>> {
        Ok(self.data.write().await.students.remove(&id))
    }

    async fn insert_course(&self, course: &Course) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        Ok(self.data.read().await.courses.get(&id).cloned())
    }

    async fn find_course_by_code(&self, code: &str) -> StoreResult<Option<Course>> {
        let data = self.data.read().await;
        Ok(data
            .courses
            .values()
            .find(|c| c.code.to_lowercase() == code.to_lowercase())
            .cloned())
    }

    async fn find_courses(&self, query: &CourseQuery) -> StoreResult<Vec<Course>> {
        let data = self.data.read().await;
        let rows: Vec<&Course> = data
            .courses
            .values()
            .filter(|c| query.filter.matches(c))
            .collect();
        Ok(window(rows, query.page, course_key(query.page.sort), |c: &Course| c.id))
    }

    async fn find_courses_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Course>> {
        Ok(by_ids(&self.data.read().await.courses, ids))
    }

    async fn replace_course(&self, course: &Course) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        Ok(match data.courses.get_mut(&course.id) {
            Some(slot) => {
                *slot = course.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        Ok(self.data.write().await.courses.remove(&id))
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(())
    }

    async fn find_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<Enrollment>> {
        let data = self.data.read().await;
        Ok(data
            .enrollments
            .values()
            .find(|e| e.student_id == student_id && e.course_id == course_id)
            .cloned())
    }

    async fn enrollments_of_student(&self, student_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        let data = self.data.read().await;
        let mut rows: Vec<Enrollment> = data
            .enrollments
            .values()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.id);
        Ok(rows)
    }

    async fn enrollments_of_course(&self, course_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        let data = self.data.read().await;
        let mut rows: Vec<Enrollment> = data
            .enrollments
            .values()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.id);
        Ok(rows)
    }

    async fn count_enrollments_of_student(&self, student_id: Uuid) -> StoreResult<u64> {
        let data = self.data.read().await;
        Ok(data
            .enrollments
            .values()
            .filter(|e| e.student_id == student_id)
            .count() as u64)
    }

    async fn count_enrollments_of_course(&self, course_id: Uuid) -> StoreResult<u64> {
        let data = self.data.read().await;
        Ok(data
            .enrollments
            .values()
            .filter(|e| e.course_id == course_id)
            .count() as u64)
    }

    async fn delete_enrollment(&self, student_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let id = data
            .enrollments
            .values()
            .find(|e| e.student_id == student_id && e.course_id == course_id)
            .map(|e| e.id);
        Ok(id.and_then(|id| data.enrollments.remove(&id)).is_some())
    }

    async fn delete_enrollments_of_student(&self, student_id: Uuid) -> StoreResult<u64> {
        self.check_cascade()?;
        let mut data = self.data.write().await;
        let before = data.enrollments.len();
        data.enrollments.retain(|_, e| e.student_id != student_id);
        Ok((before - data.enrollments.len()) as u64)
    }

    async fn delete_enrollments_of_course(&self, course_id: Uuid) -> StoreResult<u64> {
        self.check_cascade()?;
        let mut data = self.data.write().await;
        let before = data.enrollments.len();
        data.enrollments.retain(|_, e| e.course_id != course_id);
        Ok((before - data.enrollments.len()) as u64)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email.to_lowercase())
            .cloned())
    }
}

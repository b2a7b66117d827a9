//! List queries: filter + allow-listed sort + bounded window

use crate::catalog::Catalog;
use crate::error::Result;
use crate::model::{Course, CourseFilter, Student, StudentFilter};
use crate::pagination::ListOptions;
use crate::store::{CourseQuery, StudentQuery};

#[derive(Clone)]
pub struct Listings {
    catalog: Catalog,
}

impl Listings {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub async fn list_students(
        &self,
        filter: Option<StudentFilter>,
        options: Option<ListOptions>,
    ) -> Result<Vec<Student>> {
        let query = StudentQuery {
            filter: filter.unwrap_or_default(),
            page: options.unwrap_or_default().page(),
        };
        self.catalog.find_students(&query).await
    }

    pub async fn list_courses(
        &self,
        filter: Option<CourseFilter>,
        options: Option<ListOptions>,
    ) -> Result<Vec<Course>> {
        let query = CourseQuery {
            filter: filter.unwrap_or_default(),
            page: options.unwrap_or_default().page(),
        };
        self.catalog.find_courses(&query).await
    }

    /// Case-insensitive substring match on major. Not paginated.
    pub async fn search_students_by_major(&self, major: &str) -> Result<Vec<Student>> {
        self.catalog.find_students_by_major(major).await
    }
}

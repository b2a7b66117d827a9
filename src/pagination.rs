//! Offset pagination and allow-listed sorting for list queries

use async_graphql::InputObject;

/// Hard ceiling on page size, applied whatever the caller asks for.
pub const MAX_LIMIT: usize = 50;

/// Page size when the caller does not supply one.
pub const DEFAULT_LIMIT: usize = 10;

/// List options accepted by `getAllStudents` / `getAllCourses`.
#[derive(InputObject, Debug, Clone, Default)]
pub struct ListOptions {
    /// Number of records to return, capped at 50.
    pub limit: Option<i32>,

    /// Number of records to skip.
    pub offset: Option<i32>,

    /// Field to sort by. Unknown fields fall back to the default field.
    pub sort_by: Option<String>,

    /// `ASC` or `DESC`.
    pub sort_order: Option<String>,
}

impl ListOptions {
    /// Limit for the store query
    pub fn limit(&self) -> usize {
        self.limit
            .map_or(DEFAULT_LIMIT, |l| usize::try_from(l).unwrap_or(0))
            .min(MAX_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.map_or(0, |o| usize::try_from(o).unwrap_or(0))
    }

    pub fn order(&self) -> SortOrder {
        match self.sort_order.as_deref() {
            Some(o) if o.eq_ignore_ascii_case("DESC") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    /// Resolve `sort_by` against the allow-list of `F`.
    pub fn sort_field<F: SortField>(&self) -> F {
        self.sort_by
            .as_deref()
            .and_then(F::from_name)
            .unwrap_or_default()
    }

    pub fn page<F: SortField>(&self) -> Page<F> {
        Page {
            sort: self.sort_field(),
            order: self.order(),
            limit: self.limit(),
            offset: self.offset(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Allow-list of sortable fields for one entity type.
pub trait SortField: Copy + Default {
    fn from_name(name: &str) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudentSort {
    #[default]
    Name,
    Age,
    Email,
    Major,
}

impl SortField for StudentSort {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "age" => Some(Self::Age),
            "email" => Some(Self::Email),
            "major" => Some(Self::Major),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseSort {
    #[default]
    Title,
    Code,
    Credits,
    Instructor,
}

impl SortField for CourseSort {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "code" => Some(Self::Code),
            "credits" => Some(Self::Credits),
            "instructor" => Some(Self::Instructor),
            _ => None,
        }
    }
}

/// Resolved window handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<F> {
    pub sort: F,
    pub order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

impl<F: Default> Default for Page<F> {
    fn default() -> Self {
        Self {
            sort: F::default(),
            order: SortOrder::Asc,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let opts = ListOptions {
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(opts.limit(), MAX_LIMIT);
        assert_eq!(ListOptions::default().limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn negative_window_clamps_to_zero() {
        let opts = ListOptions {
            limit: Some(-5),
            offset: Some(-1),
            ..Default::default()
        };
        assert_eq!(opts.limit(), 0);
        assert_eq!(opts.offset(), 0);
    }

    #[test]
    fn unknown_sort_field_falls_back() {
        let opts = ListOptions {
            sort_by: Some("password".into()),
            ..Default::default()
        };
        assert_eq!(opts.sort_field::<StudentSort>(), StudentSort::Name);
        assert_eq!(opts.sort_field::<CourseSort>(), CourseSort::Title);
    }

    #[test]
    fn allow_listed_sort_field() {
        let opts = ListOptions {
            sort_by: Some("credits".into()),
            sort_order: Some("desc".into()),
            ..Default::default()
        };
        let page = opts.page::<CourseSort>();
        assert_eq!(page.sort, CourseSort::Credits);
        assert_eq!(page.order, SortOrder::Desc);
    }
}

//! GraphQL schema: query and mutation roots plus the entity resolvers

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, Object, Result, Schema, ID};
use uuid::Uuid;

use crate::auth::{require_identity, AuthGate, AuthPayload};
use crate::catalog::Catalog;
use crate::dataloaders::Loaders;
use crate::enrollment::Enrollments;
use crate::error::IntoGraphQL;
use crate::model::{
    Course, CourseFilter, CreateCourseInput, CreateStudentInput, CreateUserInput, Student,
    StudentFilter, UpdateCourseInput, UpdateStudentInput, User,
};
use crate::pagination::ListOptions;
use crate::query::Listings;
use crate::store::DocumentStore;
use crate::token::TokenKeys;

pub type CampusSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Process-wide services shared by every request.
#[derive(Clone)]
pub struct Services {
    pub catalog: Catalog,
    pub listings: Listings,
    pub enrollments: Enrollments,
    pub auth: AuthGate,
}

impl Services {
    pub fn new(store: Arc<dyn DocumentStore>, keys: TokenKeys) -> Self {
        let catalog = Catalog::new(store.clone());
        Self {
            listings: Listings::new(catalog.clone()),
            enrollments: Enrollments::new(store),
            auth: AuthGate::new(catalog.clone(), keys),
            catalog,
        }
    }

    /// Fresh loaders for one request.
    pub fn loaders(&self) -> Loaders {
        Loaders::new(self.catalog.clone(), self.enrollments.clone())
    }
}

pub fn build_schema(services: Services) -> CampusSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(services)
        .finish()
}

/// An id that does not parse maps to the nil uuid, which is never issued,
/// so it goes through the same not-found paths as an unknown id.
fn to_uuid(id: &ID) -> Uuid {
    Uuid::parse_str(id.as_str()).unwrap_or_else(|_| Uuid::nil())
}

fn loaders<'a>(ctx: &Context<'a>) -> Option<&'a Loaders> {
    ctx.data_opt::<Loaders>()
}

fn count(n: u64) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

// ── entity resolvers ────────────────────────────────────────────────────────

#[Object]
impl Student {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.name
    }

    async fn email(&self) -> &str {
        &self.email
    }

    async fn age(&self) -> i32 {
        self.age
    }

    async fn major(&self) -> &str {
        &self.major
    }

    /// Resolved on demand from enrollments.
    async fn courses(&self, ctx: &Context<'_>) -> Result<Vec<Course>> {
        match loaders(ctx) {
            Some(loaders) => loaders.courses_of(self.id).await,
            None => ctx.data::<Services>()?.enrollments.courses_of(self.id).await,
        }
        .into_gql()
    }

    async fn courses_count(&self, ctx: &Context<'_>) -> Result<i32> {
        let services = ctx.data::<Services>()?;
        services
            .enrollments
            .courses_count_of(self.id)
            .await
            .map(count)
            .into_gql()
    }
}

#[Object]
impl Course {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn title(&self) -> &str {
        &self.title
    }

    async fn code(&self) -> &str {
        &self.code
    }

    async fn credits(&self) -> i32 {
        self.credits
    }

    async fn instructor(&self) -> &str {
        &self.instructor
    }

    /// Resolved on demand from enrollments.
    async fn students(&self, ctx: &Context<'_>) -> Result<Vec<Student>> {
        match loaders(ctx) {
            Some(loaders) => loaders.students_of(self.id).await,
            None => ctx.data::<Services>()?.enrollments.students_of(self.id).await,
        }
        .into_gql()
    }

    async fn students_count(&self, ctx: &Context<'_>) -> Result<i32> {
        let services = ctx.data::<Services>()?;
        services
            .enrollments
            .students_count_of(self.id)
            .await
            .map(count)
            .into_gql()
    }
}

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn email(&self) -> &str {
        &self.email
    }
}

#[Object]
impl AuthPayload {
    async fn token(&self) -> &str {
        &self.token
    }

    async fn user(&self) -> &User {
        &self.user
    }
}

// ── roots ───────────────────────────────────────────────────────────────────

pub struct QueryRoot;

#[Object(name = "Query")]
impl QueryRoot {
    async fn get_all_students(
        &self,
        ctx: &Context<'_>,
        filter: Option<StudentFilter>,
        options: Option<ListOptions>,
    ) -> Result<Vec<Student>> {
        let services = ctx.data::<Services>()?;
        services.listings.list_students(filter, options).await.into_gql()
    }

    async fn get_student_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Student>> {
        let services = ctx.data::<Services>()?;
        services.catalog.find_student_by_id(to_uuid(&id)).await.into_gql()
    }

    async fn get_all_courses(
        &self,
        ctx: &Context<'_>,
        filter: Option<CourseFilter>,
        options: Option<ListOptions>,
    ) -> Result<Vec<Course>> {
        let services = ctx.data::<Services>()?;
        services.listings.list_courses(filter, options).await.into_gql()
    }

    async fn get_course_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Course>> {
        let services = ctx.data::<Services>()?;
        services.catalog.find_course_by_id(to_uuid(&id)).await.into_gql()
    }

    async fn search_students_by_major(
        &self,
        ctx: &Context<'_>,
        major: String,
    ) -> Result<Vec<Student>> {
        let services = ctx.data::<Services>()?;
        services
            .listings
            .search_students_by_major(&major)
            .await
            .into_gql()
    }
}

pub struct MutationRoot;

/// Every mutation except `signup` and `login` calls [`require_identity`]
/// before touching the store.
#[Object(name = "Mutation")]
impl MutationRoot {
    async fn signup(&self, ctx: &Context<'_>, input: CreateUserInput) -> Result<AuthPayload> {
        let services = ctx.data::<Services>()?;
        services.auth.signup(input).await.into_gql()
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> Result<AuthPayload> {
        let services = ctx.data::<Services>()?;
        services.auth.login(&email, &password).await.into_gql()
    }

    async fn create_student(
        &self,
        ctx: &Context<'_>,
        input: CreateStudentInput,
    ) -> Result<Student> {
        require_identity(ctx).into_gql()?;
        let services = ctx.data::<Services>()?;
        services.catalog.create_student(input).await.into_gql()
    }

    async fn update_student(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateStudentInput,
    ) -> Result<Student> {
        require_identity(ctx).into_gql()?;
        let services = ctx.data::<Services>()?;
        let student = services
            .catalog
            .update_student(to_uuid(&id), input)
            .await
            .into_gql()?;
        if let Some(loaders) = loaders(ctx) {
            loaders.prime_student(&student).await;
        }
        Ok(student)
    }

    async fn delete_student(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Student>> {
        require_identity(ctx).into_gql()?;
        let services = ctx.data::<Services>()?;
        let id = to_uuid(&id);
        let deleted = services.catalog.delete_student(id).await.into_gql()?;
        if let Some(loaders) = loaders(ctx) {
            loaders.evict_student(id).await;
        }
        Ok(deleted)
    }

    async fn create_course(&self, ctx: &Context<'_>, input: CreateCourseInput) -> Result<Course> {
        require_identity(ctx).into_gql()?;
        let services = ctx.data::<Services>()?;
        services.catalog.create_course(input).await.into_gql()
    }

    async fn update_course(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateCourseInput,
    ) -> Result<Course> {
        require_identity(ctx).into_gql()?;
        let services = ctx.data::<Services>()?;
        let course = services
            .catalog
            .update_course(to_uuid(&id), input)
            .await
            .into_gql()?;
        if let Some(loaders) = loaders(ctx) {
            loaders.prime_course(&course).await;
        }
        Ok(course)
    }

    async fn delete_course(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Course>> {
        require_identity(ctx).into_gql()?;
        let services = ctx.data::<Services>()?;
        let id = to_uuid(&id);
        let deleted = services.catalog.delete_course(id).await.into_gql()?;
        if let Some(loaders) = loaders(ctx) {
            loaders.evict_course(id).await;
        }
        Ok(deleted)
    }

    async fn enroll_student(
        &self,
        ctx: &Context<'_>,
        student_id: ID,
        course_id: ID,
    ) -> Result<Student> {
        require_identity(ctx).into_gql()?;
        let services = ctx.data::<Services>()?;
        services
            .enrollments
            .enroll(to_uuid(&student_id), to_uuid(&course_id))
            .await
            .into_gql()
    }

    async fn unenroll_student(
        &self,
        ctx: &Context<'_>,
        student_id: ID,
        course_id: ID,
    ) -> Result<Student> {
        require_identity(ctx).into_gql()?;
        let services = ctx.data::<Services>()?;
        services
            .enrollments
            .unenroll(to_uuid(&student_id), to_uuid(&course_id))
            .await
            .into_gql()
    }
}

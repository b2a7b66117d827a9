//! # campus-graphql
//!
//! GraphQL API for students, courses and the enrollments linking them.
//!
//! ## Features
//!
//! - **Catalog** - Student and course records with validation and case-insensitive uniqueness
//! - **Enrollments** - Idempotent enroll, unenroll, cascading cleanup on delete
//! - **Listings** - Filtered lists with allow-listed sorting and a capped page size
//! - **Auth** - Signup/login issuing 7-day HS256 bearer tokens; mutations require one
//! - **DataLoader** - Per-request batch loading for nested `courses` / `students`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use campus_graphql::{build_router, build_schema, InMemoryStore, Services, TokenKeys};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let services = Services::new(Arc::new(InMemoryStore::new()), TokenKeys::from_secret("secret"));
//! let router = build_router(build_schema(services.clone()), services);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod dataloaders;
pub mod enrollment;
pub mod error;
pub mod model;
pub mod pagination;
pub mod password;
pub mod query;
pub mod schema;
pub mod server;
pub mod store;
pub mod token;

pub use auth::{extract_bearer, graphql_handler, AuthGate, Identity};
pub use catalog::Catalog;
pub use config::Config;
pub use dataloaders::{BatchLoader, DataLoader, Loaders};
pub use enrollment::Enrollments;
pub use error::{ApiError, Result, StoreError};
pub use pagination::{ListOptions, MAX_LIMIT};
pub use query::Listings;
pub use schema::{build_schema, CampusSchema, Services};
pub use server::build_router;
pub use store::{DocumentStore, InMemoryStore};
pub use token::TokenKeys;

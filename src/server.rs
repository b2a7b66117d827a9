//! HTTP surface: the GraphQL endpoint, GraphiQL and a liveness probe.

use async_graphql::http::GraphiQLSource;
use async_graphql::EmptySubscription;
use axum::{
    extract::Extension,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::auth::graphql_handler;
use crate::schema::{CampusSchema, MutationRoot, QueryRoot, Services};

pub const GRAPHQL_PATH: &str = "/graphql";

pub fn build_router(schema: CampusSchema, services: Services) -> Router {
    Router::new()
        .route(
            GRAPHQL_PATH,
            get(graphiql).post(graphql_handler::<QueryRoot, MutationRoot, EmptySubscription>),
        )
        .route("/health", get(health))
        .layer(Extension(schema))
        .layer(Extension(services))
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

async fn health() -> &'static str {
    "ok"
}

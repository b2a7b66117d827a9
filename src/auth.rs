//! Authentication: signup/login, per-request identity and the mutation gate
//!
//! Provides helpers for:
//! - Extracting the bearer token from the `authorization` header
//! - Resolving the calling identity (anonymous on any failure)
//! - Standard Axum handler for the GraphQL endpoint with identity injection
//! - Requiring an identity inside mutation resolvers

use async_graphql::{Context, Request, Response, Schema};
use axum::{extract::Extension, http::HeaderMap, Json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{ApiError, Entity, Result};
use crate::model::{validate_email, CreateUserInput, User};
use crate::password::{hash_password, verify_password};
use crate::schema::Services;
use crate::token::TokenKeys;

/// Authenticated caller, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Token plus the user it was issued for.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// Extract the token from an `authorization: Bearer <token>` header.
///
/// Any other scheme, or a header without a token part, yields `None`.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct AuthGate {
    catalog: Catalog,
    keys: TokenKeys,
}

impl AuthGate {
    pub fn new(catalog: Catalog, keys: TokenKeys) -> Self {
        Self { catalog, keys }
    }

    pub async fn signup(&self, input: CreateUserInput) -> Result<AuthPayload> {
        let email = input.email.trim().to_lowercase();
        validate_email(&email)?;
        if input.password.is_empty() {
            return Err(ApiError::invalid("Password is required"));
        }
        if self.catalog.find_user_by_email(&email).await?.is_some() {
            return Err(ApiError::AlreadyExists("Email already exists".into()));
        }

        let password = input.password;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task: {e}")))??;

        let user = self.catalog.create_user(&email, hash).await?;
        let token = self.issue(&user.email)?;
        info!(user_id = %user.id, "user signed up");
        Ok(AuthPayload { token, user })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload> {
        let email = email.trim().to_lowercase();
        let user = self
            .catalog
            .find_user_by_email(&email)
            .await?
            .ok_or(ApiError::NotFound(Entity::User))?;

        let (password, stored) = (password.to_string(), user.password_hash.clone());
        let matched = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task: {e}")))?;
        if !matched {
            return Err(ApiError::InvalidCredentials);
        }

        let token = self.issue(&user.email)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthPayload { token, user })
    }

    fn issue(&self, email: &str) -> Result<String> {
        self.keys
            .issue(email)
            .map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// Resolve the caller from request headers.
    ///
    /// Missing header, wrong scheme, bad signature, expiry and unknown users
    /// all resolve to `None`; this never fails the request.
    pub async fn resolve_identity(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = extract_bearer(headers)?;
        let claims = match self.keys.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "bearer token rejected");
                return None;
            }
        };
        match self.catalog.find_user_by_email(&claims.sub).await {
            Ok(Some(user)) => Some(Identity {
                user_id: user.id,
                email: user.email,
            }),
            Ok(None) => {
                debug!(email = %claims.sub, "token subject no longer exists");
                None
            }
            Err(e) => {
                debug!(error = %e, "identity lookup failed");
                None
            }
        }
    }
}

/// GraphQL handler with identity injection
///
/// Resolves the caller from the `authorization` header and attaches it,
/// together with fresh per-request loaders, to the request.
///
/// # Example
///
/// ```rust,no_run
/// use axum::{Router, routing::post};
/// use campus_graphql::auth::graphql_handler;
/// use campus_graphql::schema::{MutationRoot, QueryRoot};
/// use async_graphql::EmptySubscription;
///
/// let app: Router = Router::new()
///     .route("/graphql", post(graphql_handler::<QueryRoot, MutationRoot, EmptySubscription>));
/// ```
pub async fn graphql_handler<Query, Mutation, Subscription>(
    Extension(schema): Extension<Schema<Query, Mutation, Subscription>>,
    Extension(services): Extension<Services>,
    headers: HeaderMap,
    req: Json<Request>,
) -> Json<Response>
where
    Query: async_graphql::ObjectType + 'static,
    Mutation: async_graphql::ObjectType + 'static,
    Subscription: async_graphql::SubscriptionType + 'static,
{
    let mut request = req.0;

    if let Some(identity) = services.auth.resolve_identity(&headers).await {
        request = request.data(identity);
    }
    request = request.data(services.loaders());

    Json(schema.execute(request).await)
}

/// Identity of the caller, if one was resolved.
pub fn get_identity<'a>(ctx: &Context<'a>) -> Option<&'a Identity> {
    ctx.data_opt::<Identity>()
}

/// Gate for mutations: fails with `Unauthenticated` for anonymous callers.
pub fn require_identity<'a>(ctx: &Context<'a>) -> Result<&'a Identity> {
    get_identity(ctx).ok_or(ApiError::Unauthenticated)
}

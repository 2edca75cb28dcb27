//! Request extractors
//!
//! Every rejection is turned into an [`ApiError`] so malformed input reports
//! as `VALIDATION` instead of axum's plain-text defaults.

use super::error::ApiError;
use crate::auth::bearer_token;
use crate::context::AppContext;
use crate::core::User;
use crate::error::{self, ServiceDeskError};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Runs a storage-bound call on the blocking pool
///
/// The file backend reads YAML from disk; keeping that off the async workers
/// stops one slow scan from stalling unrelated requests.
pub(crate) async fn blocking<T, F>(ctx: &Arc<AppContext>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppContext) -> error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let ctx = Arc::clone(ctx);
    tokio::task::spawn_blocking(move || f(&ctx))
        .await
        .map_err(|e| ServiceDeskError::custom(format!("Blocking task failed: {e}")))?
        .map_err(ApiError::from)
}

/// The authenticated caller, resolved from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<Arc<AppContext>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ServiceDeskError::Unauthenticated)?
            .to_string();

        let user = blocking(ctx, move |ctx| ctx.authenticator.authenticate(&token)).await?;
        Ok(Self(user))
    }
}

/// JSON body whose rejection is a `VALIDATION` error
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string whose rejection is a `VALIDATION` error
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthenticator;
    use crate::core::Role;
    use axum::http::Request;
    use mockall::predicate::eq;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/tickets");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_bearer_token_is_passed_to_authenticator() {
        let user = User::new("kasun", Role::Technician);
        let expected = user.clone();
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate()
            .with(eq("secret"))
            .times(1)
            .returning(move |_| Ok(expected.clone()));
        let ctx = Arc::new(AppContext::in_memory().unwrap().with_authenticator(Arc::new(auth)));

        let CurrentUser(found) =
            CurrentUser::from_request_parts(&mut parts(Some("Bearer secret")), &ctx)
                .await
                .unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_missing_header_skips_authenticator() {
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate().never();
        let ctx = Arc::new(AppContext::in_memory().unwrap().with_authenticator(Arc::new(auth)));

        let rejection = CurrentUser::from_request_parts(&mut parts(None), &ctx)
            .await
            .unwrap_err();
        assert_eq!(rejection.status, axum::http::StatusCode::UNAUTHORIZED);
    }
}

//! Extracts the authenticated actor's admin ID from a request.
//!
//! Authentication itself is owned by an external collaborator; by the time a
//! request reaches this service the actor has been resolved and is carried
//! in the `X-Admin-Id` header. The ID is passed explicitly into the
//! persistence layer rather than read from ambient state, which keeps the
//! core testable.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::database_id::AdminId;

/// The header carrying the resolved admin ID.
pub const ADMIN_ID_HEADER: &str = "x-admin-id";

/// The admin ID recorded when the header is missing or malformed, matching
/// the registration desk's shared terminal account.
const DEFAULT_ADMIN_ID: AdminId = 1;

/// The ID of the admin acting on the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub AdminId);

impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id_admin = parts
            .headers
            .get(ADMIN_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_ADMIN_ID);

        Ok(Self(id_admin))
    }
}

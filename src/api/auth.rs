// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::SocialError;

/// Header carrying the authenticated user id, set by the auth gateway
pub const ACTOR_HEADER: &str = "x-authenticated-user";

/// The authenticated user making the request; `None` for anonymous visitors
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Option<Uuid>);

impl Actor {
    pub fn id(&self) -> Option<Uuid> {
        self.0
    }

    pub fn require(&self) -> Result<Uuid, SocialError> {
        self.0.ok_or_else(SocialError::not_logged_in)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = SocialError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACTOR_HEADER) else {
            return Ok(Actor(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(|id| Actor(Some(id)))
            .ok_or(SocialError::Authorization("Invalid authentication header."))
    }
}

//! Bearer credential extraction.

use crate::response::ApiError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use gym_core::{AccountId, Error};

/// Account resolved from a verified `Authorization: Bearer` header
#[derive(Clone, Debug)]
pub struct Authenticated(pub AccountId);

/// What the `Authorization` header carried
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Credential<'a> {
    Missing,
    Bearer(&'a str),
    /// Some other scheme, or a header that is not valid text
    Unsupported,
}

pub(crate) fn credential(headers: &HeaderMap) -> Credential<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Credential::Missing;
    };
    let Ok(value) = value.to_str() else {
        return Credential::Unsupported;
    };

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next()) {
        (None, _) | (Some(_), None) => Credential::Missing,
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            Credential::Bearer(token)
        }
        _ => Credential::Unsupported,
    }
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match credential(&parts.headers) {
            Credential::Missing => Err(Error::MissingCredential.into()),
            Credential::Unsupported => {
                Err(Error::InvalidCredential("unsupported authorization scheme".into()).into())
            }
            Credential::Bearer(token) => Ok(Authenticated(state.identity.verify(token)?)),
        }
    }
}

//! Request extractors shared by the Motionbooth handlers
//!
//! `Pagination` reads `?skip=&limit=` for the moderation queues and status
//! listings; `ValidatedJson` deserializes a body and runs its `validator`
//! rules, reporting both kinds of failure as a 400.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use validator::{Validate, ValidationErrors};

use crate::Error;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 1000;

/// `?skip=&limit=` (`offset` is accepted for `skip`)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default, alias = "offset")]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Rows to skip; negatives count as 0
    pub fn offset(&self) -> i64 {
        self.skip.map_or(0, |skip| skip.max(0))
    }

    /// Page size in `1..=1000`, 100 when absent
    pub fn limit(&self) -> i64 {
        self.limit
            .map_or(DEFAULT_PAGE_SIZE, |limit| limit.clamp(1, MAX_PAGE_SIZE))
    }
}

/// JSON body that has passed its `Validate` rules
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::Validation(rejection.body_text()))?;

        body.validate()
            .map_err(|errors| Error::Validation(describe(&errors)))?;

        Ok(Self(body))
    }
}

/// "Invalid field(s): comment, user_prompt" with fields sorted for stable messages
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_keys()
        .map(|field| field.to_string())
        .collect();
    fields.sort_unstable();
    format!("Invalid field(s): {}", fields.join(", "))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use strum_macros::AsRefStr;

use super::{routes::NewsletterError, types::SubscriptionOutcome};

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("newsletter error: {0}")]
    Newsletter(#[from] NewsletterError),
}

impl Error {
    /// The outcome the client gets to see for this error.
    pub fn client_outcome(&self) -> SubscriptionOutcome {
        match self {
            Error::Newsletter(newsletter_er) => newsletter_er.client_outcome(),
        }
    }

    /// Errors whose cause is only meant for the server logs.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.client_outcome(),
            SubscriptionOutcome::ServiceUnavailable | SubscriptionOutcome::InternalError
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

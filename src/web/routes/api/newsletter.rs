use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
};
use strum_macros::AsRefStr;
use tracing::info;

use crate::{
    mailchimp,
    utils::error_chain_fmt,
    web::{
        types::{DataParsingError, SubscriberEmail, SubscriptionOutcome, SubscriptionRequest},
        WebResult,
    },
    AppState,
};

// ###################################
// ->   ERROR
// ###################################
#[derive(AsRefStr, thiserror::Error)]
pub enum NewsletterError {
    #[error("failed to read the request body: {0}")]
    UnreadableBody(#[from] BytesRejection),
    #[error("failed to deserialize the request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),
    #[error("newsletter provider is not configured: {0}")]
    Misconfigured(String),
    #[error("mailchimp client error: {0}")]
    Provider(#[from] mailchimp::Error),
}

impl std::fmt::Debug for NewsletterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl NewsletterError {
    pub fn client_outcome(&self) -> SubscriptionOutcome {
        match self {
            NewsletterError::DataParsing(_) => SubscriptionOutcome::invalid_email(),
            NewsletterError::Misconfigured(_) => SubscriptionOutcome::ServiceUnavailable,
            NewsletterError::UnreadableBody(_)
            | NewsletterError::MalformedBody(_)
            | NewsletterError::Provider(_) => SubscriptionOutcome::InternalError,
        }
    }
}

// ###################################
// ->   API
// ###################################
/// Forwards one email address to the mailing-list provider.
///
/// The body is read as JSON without looking at the content type.
/// The input is validated and the provider configuration checked before anything goes out,
/// after that exactly one provider call is made.
#[tracing::instrument(name = "Subscribing to the newsletter", skip_all)]
pub async fn newsletter_subscribe(
    State(app_state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> WebResult<SubscriptionOutcome> {
    let body = body.map_err(NewsletterError::UnreadableBody)?;
    let request =
        SubscriptionRequest::from_json_slice(&body).map_err(NewsletterError::MalformedBody)?;
    let email = SubscriberEmail::try_from(request).map_err(NewsletterError::DataParsing)?;

    let provider = app_state
        .provider
        .as_ref()
        .map_err(|er| NewsletterError::Misconfigured(er.to_string()))?;

    let added = provider
        .add_member(&email)
        .await
        .map_err(NewsletterError::Provider)?;
    let outcome = SubscriptionOutcome::from(added);

    info!(outcome = outcome.as_ref(), "Newsletter request settled");
    Ok(outcome)
}

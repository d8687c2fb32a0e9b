//! Request and response types of the `web` module.
//! Includes the input that needs to be validated, its parsing implementation and the
//! outcome every newsletter request resolves to.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::AsRefStr;

use crate::mailchimp::AddMember;

pub const INVALID_EMAIL_MSG: &str = "Valid email is required";
pub const MISCONFIGURED_MSG: &str = "Newsletter service configuration error";
pub const ALREADY_SUBSCRIBED_MSG: &str = "You are already subscribed!";
pub const SUBSCRIBED_MSG: &str = "Successfully subscribed!";
pub const REJECTED_FALLBACK_MSG: &str = "Failed to subscribe";
pub const INTERNAL_ERROR_MSG: &str = "Internal server error";

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("email is missing")]
    EmailMissing,
    #[error("email doesn't contain an '@': {0}")]
    EmailInvalid(String),
}

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable subscription request.
/// The email can be missing, it is validated when converting to a `SubscriberEmail`.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub email: Option<String>,
}

impl SubscriptionRequest {
    /// Reads the request body whatever its content type says.
    /// Only an object can carry an `email`, any other JSON value is a request without one.
    /// Fails on a body that isn't JSON, on `null` and on an `email` that isn't a string.
    pub fn from_json_slice(body: &[u8]) -> serde_json::Result<Self> {
        match serde_json::from_slice::<Value>(body)? {
            value @ (Value::Object(_) | Value::Null) => serde_json::from_value(value),
            _ => Ok(SubscriptionRequest::default()),
        }
    }
}

/// Validated subscriber email.
///
/// Only checks for an '@'. It is not an RFC 5322 validation and says nothing
/// about whether the address can actually receive mail, the provider has the final word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(DataParsingError::EmailMissing);
        }
        if !value.contains('@') {
            return Err(DataParsingError::EmailInvalid(value.to_owned()));
        }

        Ok(SubscriberEmail(value.to_owned()))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<SubscriptionRequest> for SubscriberEmail {
    type Error = DataParsingError;

    fn try_from(request: SubscriptionRequest) -> Result<Self, Self::Error> {
        let email = request.email.ok_or(DataParsingError::EmailMissing)?;
        SubscriberEmail::parse(email)
    }
}

/// The closed set of results a newsletter subscription request can produce.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
pub enum SubscriptionOutcome {
    /// The provider added the address.
    Created,
    /// The provider already had the address. Subscribing twice is not an error.
    AlreadySubscribed,
    /// The input or the provider refused the subscription.
    Rejected { status: StatusCode, reason: String },
    /// The provider credentials are not configured.
    ServiceUnavailable,
    InternalError,
}

impl SubscriptionOutcome {
    pub fn invalid_email() -> Self {
        SubscriptionOutcome::Rejected {
            status: StatusCode::BAD_REQUEST,
            reason: INVALID_EMAIL_MSG.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionOutcome::Created => StatusCode::CREATED,
            SubscriptionOutcome::AlreadySubscribed => StatusCode::OK,
            SubscriptionOutcome::Rejected { status, .. } => *status,
            SubscriptionOutcome::ServiceUnavailable | SubscriptionOutcome::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> OutcomeBody<'_> {
        match self {
            SubscriptionOutcome::Created => OutcomeBody::Message(SUBSCRIBED_MSG),
            SubscriptionOutcome::AlreadySubscribed => OutcomeBody::Message(ALREADY_SUBSCRIBED_MSG),
            SubscriptionOutcome::Rejected { reason, .. } => OutcomeBody::Error(reason),
            SubscriptionOutcome::ServiceUnavailable => OutcomeBody::Error(MISCONFIGURED_MSG),
            SubscriptionOutcome::InternalError => OutcomeBody::Error(INTERNAL_ERROR_MSG),
        }
    }
}

/// Serializes to either `{ "message": .. }` or `{ "error": .. }`.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeBody<'a> {
    Message(&'a str),
    Error(&'a str),
}

/// A provider answer that isn't a success is only an error for the caller when
/// the address wasn't already on the list.
impl From<AddMember> for SubscriptionOutcome {
    fn from(add_member: AddMember) -> Self {
        match add_member {
            AddMember::Added => SubscriptionOutcome::Created,
            AddMember::MemberExists => SubscriptionOutcome::AlreadySubscribed,
            AddMember::Rejected { status, detail } => SubscriptionOutcome::Rejected {
                status,
                reason: detail.unwrap_or_else(|| REJECTED_FALLBACK_MSG.to_string()),
            },
        }
    }
}

/// The outcome rides along in the response extensions for the response mapper to log.
impl IntoResponse for SubscriptionOutcome {
    fn into_response(self) -> Response {
        let mut res = (self.status_code(), Json(self.body())).into_response();
        res.extensions_mut().insert(self);
        res
    }
}

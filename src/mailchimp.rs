use std::time::Duration;

use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;

use crate::{config::ProviderCredentials, utils, web::types::SubscriberEmail};

/// The error title Mailchimp answers with when the address is already on the list.
/// Matched exactly, a reworded title on the provider side turns duplicates into rejections.
pub const MEMBER_EXISTS_TITLE: &str = "Member Exists";
/// Mailchimp ignores the username part of Basic auth.
const AUTH_USERNAME: &str = "anystring";

#[derive(Debug, AsRefStr)]
pub enum MemberStatus {
    #[strum(serialize = "subscribed")]
    Subscribed,
}

/// What the provider made of an "add member" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddMember {
    Added,
    MemberExists,
    Rejected {
        status: StatusCode,
        detail: Option<String>,
    },
}

#[derive(Debug)]
pub struct MailchimpClient {
    http_client: Client,
    pub members_url: reqwest::Url,
    auth_header: SecretString,
}

impl MailchimpClient {
    pub fn new(credentials: ProviderCredentials, timeout: Duration) -> Result<Self> {
        let members_url = reqwest::Url::parse(&credentials.base_url())
            .and_then(|base| base.join(&format!("lists/{}/members", credentials.audience_id)))
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let basic_creds = format!(
            "{AUTH_USERNAME}:{}",
            credentials.api_key.expose_secret()
        );
        let auth_header = SecretString::from(format!("Basic {}", utils::b64_encode(basic_creds)));

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(MailchimpClient {
            http_client,
            members_url,
            auth_header,
        })
    }

    /// Asks the provider to add `email` to the audience as a subscribed member.
    /// Sends exactly one request, there are no retries.
    #[tracing::instrument(name = "Adding member to the audience", skip_all)]
    pub async fn add_member(&self, email: &SubscriberEmail) -> Result<AddMember> {
        let new_member = NewMember {
            email_address: email.as_ref(),
            status: MemberStatus::Subscribed.as_ref(),
        };

        let resp = self
            .http_client
            .post(self.members_url.clone())
            .header(AUTHORIZATION, self.auth_header.expose_secret())
            .json(&new_member)
            .send()
            .await?;

        let status = resp.status();
        // A body that isn't JSON is a broken answer whatever the status says.
        if status.is_success() {
            let _member: serde_json::Value = resp.json().await?;
            return Ok(AddMember::Added);
        }

        let error_body: ProviderErrorBody = resp.json().await?;
        tracing::debug!(%status, title = ?error_body.title, "provider refused the member");

        if error_body.title.as_deref() == Some(MEMBER_EXISTS_TITLE) {
            return Ok(AddMember::MemberExists);
        }

        Ok(AddMember::Rejected {
            status,
            detail: error_body.detail.filter(|detail| !detail.is_empty()),
        })
    }
}

#[derive(Serialize)]
pub struct NewMember<'a> {
    pub email_address: &'a str,
    pub status: &'a str,
}

/// The parts of Mailchimp's problem-details error body we care about.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    title: Option<String>,
    detail: Option<String>,
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to build the members url: {0}")]
    UrlParsing(String),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

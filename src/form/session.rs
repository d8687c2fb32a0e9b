use std::{sync::Arc, time::Duration};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::warn;

use super::{FormController, FormState, Settlement, SubmitAction, CONFIRMATION_WINDOW};

/// Posts emails to the newsletter endpoint.
#[derive(Debug, Clone)]
pub struct SubscribeClient {
    http_client: Client,
    pub endpoint: reqwest::Url,
}

/// Status and body of an endpoint response.
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl SubscribeClient {
    pub fn new<S: AsRef<str>>(endpoint: S) -> Result<Self> {
        let endpoint =
            reqwest::Url::parse(endpoint.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;
        let http_client = Client::builder().build()?;

        Ok(SubscribeClient {
            http_client,
            endpoint,
        })
    }

    pub async fn post_email(&self, email: &str) -> Result<SubmitResponse> {
        let resp = self
            .http_client
            .post(self.endpoint.clone())
            .json(&json!({ "email": email }))
            .send()
            .await?;

        let status = resp.status();
        // A body we can't read still leaves the status to go by.
        let body = resp.json::<ResponseBody>().await.unwrap_or_default();

        Ok(SubmitResponse { status, body })
    }
}

impl From<SubmitResponse> for Settlement {
    fn from(resp: SubmitResponse) -> Self {
        if resp.status.is_success() {
            Settlement::Subscribed
        } else {
            Settlement::Refused(resp.body.error)
        }
    }
}

/// One form instance: the controller plus the client it submits with.
/// Cloning shares the same form.
#[derive(Debug, Clone)]
pub struct FormSession {
    controller: Arc<Mutex<FormController>>,
    client: SubscribeClient,
    confirmation_window: Duration,
}

impl FormSession {
    pub fn new(client: SubscribeClient) -> Self {
        FormSession {
            controller: Arc::new(Mutex::new(FormController::new())),
            client,
            confirmation_window: CONFIRMATION_WINDOW,
        }
    }

    pub fn with_confirmation_window(mut self, confirmation_window: Duration) -> Self {
        self.confirmation_window = confirmation_window;
        self
    }

    pub async fn set_email(&self, email: impl Into<String>) {
        self.controller.lock().await.set_email(email);
    }

    pub async fn email(&self) -> String {
        self.controller.lock().await.email().to_string()
    }

    pub async fn state(&self) -> FormState {
        self.controller.lock().await.state().clone()
    }

    pub async fn is_submit_enabled(&self) -> bool {
        self.controller.lock().await.is_submit_enabled()
    }

    /// Runs one submission to completion. The lock is not held while the request is in flight,
    /// a concurrent `submit` on the same form sees `Submitting` and is ignored.
    pub async fn submit(&self) -> SubmitAction {
        let email = match self.controller.lock().await.begin_submit() {
            SubmitAction::Send(email) => email,
            other => return other,
        };

        let settlement = match self.client.post_email(&email).await {
            Ok(resp) => Settlement::from(resp),
            Err(er) => {
                warn!("{:<12} - newsletter endpoint unreachable: {er}", "FORM_SUBMIT");
                Settlement::Unreachable
            }
        };

        let ticket = self.controller.lock().await.settle(settlement);

        if let Some(ticket) = ticket {
            let controller = self.controller.clone();
            let window = self.confirmation_window;
            tokio::spawn(async move {
                tokio::time::sleep(window).await;
                controller.lock().await.dismiss_confirmation(ticket);
            });
        }

        SubmitAction::Send(email)
    }
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse the endpoint url: {0}")]
    UrlParsing(String),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

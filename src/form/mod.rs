//! Client-side controller of the newsletter signup form.
//!
//! `FormController` is the synchronous state machine, `FormSession` drives it against
//! the `/api/newsletter` endpoint and schedules the dismissal of the confirmation.
//!
//! ```text
//!  Idle --submit(no '@')--> Error --edit--> Idle
//!  Idle --submit--> Submitting --settle(ok)--> Success --5s--> Idle
//!                             \--settle(err)--> Error
//! ```

mod session;

use std::time::Duration;

pub use session::{Error, FormSession, ResponseBody, SubmitResponse, SubscribeClient};

/// How long the confirmation stays visible after a successful submission.
pub const CONFIRMATION_WINDOW: Duration = Duration::from_secs(5);

pub const INVALID_EMAIL_MSG: &str = "Please enter a valid email address";
pub const FALLBACK_ERROR_MSG: &str = "Failed to subscribe";
pub const NETWORK_ERROR_MSG: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,
    Submitting,
    Success,
    Error(String),
}

/// What a call to `FormController::begin_submit` decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    /// A submission is already in flight.
    Ignored,
    /// The email didn't pass the client-side check, nothing was sent.
    Invalid,
    /// The email should be posted to the endpoint.
    Send(String),
}

/// How a submission ended, as far as the form is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Subscribed,
    Refused(Option<String>),
    Unreachable,
}

/// Identifies the success whose confirmation a scheduled dismissal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationTicket(u64);

#[derive(Debug, Default)]
pub struct FormController {
    email: String,
    state: FormState,
    confirmations: u64,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            FormState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// The submit control is disabled while a submission is in flight.
    pub fn is_submit_enabled(&self) -> bool {
        self.state != FormState::Submitting
    }

    /// Replaces the input text. A displayed error goes away as soon as the user edits.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        if matches!(self.state, FormState::Error(_)) {
            self.state = FormState::Idle;
        }
    }

    pub fn begin_submit(&mut self) -> SubmitAction {
        if self.state == FormState::Submitting {
            return SubmitAction::Ignored;
        }

        if !self.email.contains('@') {
            self.state = FormState::Error(INVALID_EMAIL_MSG.to_string());
            return SubmitAction::Invalid;
        }

        self.state = FormState::Submitting;
        SubmitAction::Send(self.email.clone())
    }

    /// Applies the result of the in-flight submission.
    /// On success the input is cleared and a ticket for the later dismissal is handed out.
    pub fn settle(&mut self, settlement: Settlement) -> Option<ConfirmationTicket> {
        if self.state != FormState::Submitting {
            return None;
        }

        match settlement {
            Settlement::Subscribed => {
                self.email.clear();
                self.state = FormState::Success;
                self.confirmations += 1;
                Some(ConfirmationTicket(self.confirmations))
            }
            Settlement::Refused(error) => {
                let msg = error
                    .filter(|er| !er.is_empty())
                    .unwrap_or_else(|| FALLBACK_ERROR_MSG.to_string());
                self.state = FormState::Error(msg);
                None
            }
            Settlement::Unreachable => {
                self.state = FormState::Error(NETWORK_ERROR_MSG.to_string());
                None
            }
        }
    }

    /// Hides the confirmation if it still belongs to `ticket`. Returns whether it did.
    pub fn dismiss_confirmation(&mut self, ticket: ConfirmationTicket) -> bool {
        if self.state == FormState::Success && ticket.0 == self.confirmations {
            self.state = FormState::Idle;
            return true;
        }
        false
    }
}

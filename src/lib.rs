//! A small service relaying newsletter signups to a Mailchimp audience,
//! plus the client-side controller of the signup form.

pub mod app;
pub mod config;
mod error;
pub mod form;
pub mod mailchimp;
mod utils;
pub mod web;

pub use app::{App, AppState};
pub use error::{Error, Result};
pub use mailchimp::MailchimpClient;
pub use web::serve;

use tracing_subscriber::EnvFilter;

/// Human readable logs for local development.
/// `RUST_LOG` takes precedence over the default filter.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("newsletter_relay=debug,tower_http=debug")),
        )
        .compact()
        .init();
}

/// JSON logs, one object per line.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

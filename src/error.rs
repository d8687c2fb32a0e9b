use crate::{config, mailchimp};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("mailchimp client error: {0}")]
    Mailchimp(#[from] mailchimp::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

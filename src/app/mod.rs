use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, ConfigError},
    MailchimpClient, Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    /// Builds the `AppState` and binds the listener.
    ///
    /// Missing provider credentials don't stop the app from starting, they are kept in the
    /// state so every newsletter request can answer with a configuration error.
    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let provider = match config.provider_config.credentials() {
            Ok(credentials) => Ok(MailchimpClient::new(
                credentials,
                config.provider_config.timeout(),
            )?),
            Err(er) => {
                warn!("{:<20} - {}", "Newsletter disabled:", er);
                Err(er)
            }
        };

        let app_state = AppState::new(provider);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

pub struct InternalState {
    pub provider: core::result::Result<MailchimpClient, ConfigError>,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(provider: core::result::Result<MailchimpClient, ConfigError>) -> Self {
        AppState(Arc::new(InternalState { provider }))
    }
}

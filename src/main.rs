use anyhow::Context;
use newsletter_relay::{config::AppConfig, App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // We have a different logging mechanism for production
    #[cfg(not(debug_assertions))]
    {
        newsletter_relay::init_production_tracing()
    }
    #[cfg(debug_assertions)]
    {
        newsletter_relay::init_dbg_tracing();
    }

    let config = AppConfig::load()
        .inspect_err(|er| tracing::error!("Fatal Error: {er}"))
        .context("loading the configuration")?;
    let app = App::build_from_config(config)
        .await
        .context("starting the newsletter relay")?;

    newsletter_relay::serve(app)
        .await
        .context("serving the newsletter relay")?;

    Ok(())
}

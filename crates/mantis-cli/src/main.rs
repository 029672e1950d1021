use mantis::{Mantis, OAuthConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod render;
mod repl;

use config::Config;
use repl::Repl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting {} ({})", config.app.title, config.app.environment);
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!("API base URL: {}", config.api.base_url);

    let mantis = build_client(&config)?;

    let events = spawn_event_printer(&mantis);
    let result = Repl::new(mantis, config.app.title.clone()).run().await;
    events.abort();

    tracing::info!("Shutting down");
    result
}

fn build_client(config: &Config) -> anyhow::Result<Mantis> {
    let mut identity = OAuthConfig::new(&config.identity.domain, &config.identity.client_id)
        .redirect_uri(&config.identity.redirect_uri);
    if let Some(audience) = &config.identity.audience {
        identity = identity.audience(audience);
    }

    Mantis::builder()
        .base_url(&config.api.base_url)
        .timeout(config.api.timeout)
        .upload_timeout(config.api.upload_timeout)
        .credentials_file(&config.storage_path)
        .identity(identity)
        .turn_config(config.polling.turn)
        .document_poll_config(config.polling.documents)
        .thread_page_config(config.polling.threads)
        .build()
}

/// Prints session events that need the user's attention
fn spawn_event_printer(mantis: &Mantis) -> tokio::task::JoinHandle<()> {
    let mut events = mantis.session_bus().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(mantis::SessionEvent::LoginRedirect { url }) => {
                    println!("\nYour session expired. Sign in again at:\n  {url}");
                }
                Ok(mantis::SessionEvent::HardNavigate { path }) => {
                    println!("\nSign-in required ({path}). Use /login <email> <password>.");
                }
                Ok(mantis::SessionEvent::LoggedOut) => println!("\nSigned out."),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} session events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

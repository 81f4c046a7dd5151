use mock_server::ServerSettings;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "4040".to_string());
    let addr = format!("127.0.0.1:{port}");
    let settings = ServerSettings::default();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, version = %settings.version, "listening");
    mock_server::serve(listener, settings).await
}

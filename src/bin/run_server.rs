use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_db::db::Catalog;
use movie_db::{server, Error};

const CATALOG_FILENAME: &str = "movies.csv";

/// Concurrent movie catalog server.
#[derive(Parser, Debug)]
struct CliArgs {
    /// The TCP port to listen on.
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let catalog = Catalog::load(CATALOG_FILENAME)?;
    info!("loaded {} movies from {}", catalog.len(), CATALOG_FILENAME);

    // A bind failure is fatal; everything after this point keeps the
    // process alive.
    let listener = TcpListener::bind(("0.0.0.0", cli_args.port)).await?;
    info!("listening on port {}", cli_args.port);

    server::run(listener, catalog, signal::ctrl_c()).await;

    Ok(())
}

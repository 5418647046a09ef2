use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use joinecogrow::api::{self, AppState};
use joinecogrow::config::AppConfig;
use joinecogrow::integrations::IntegrationClient;
use joinecogrow::pipeline::{Orchestrator, PipelineRequest};
use joinecogrow::store;

#[derive(Parser)]
#[command(name = "ecogrow")]
#[command(about = "JoinEcoGrow feature catalog and component pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Run the master workflow once and print the report as JSON
    Run {
        /// Description of the component to generate
        prompt: String,
    },
    /// Print feature catalog counts
    Stats,
}

/// Initialize tracing with output to stderr (for JSON on stdout) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "joinecogrow=debug,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(config: AppConfig, host: &str, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting JoinEcoGrow server on {}:{}", host, port);

    let store = store::connect(config.database_path);
    let state = AppState::new(
        store,
        IntegrationClient::new(config.integrations),
        config.pipeline,
    );
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("JoinEcoGrow server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // `run` and `stats` print JSON on stdout
    let use_stderr = matches!(cli.command, Some(Commands::Run { .. } | Commands::Stats));
    init_tracing(use_stderr);

    let config = AppConfig::from_env();

    match cli.command {
        Some(Commands::Serve { port, host }) => serve(config, &host, port).await?,
        Some(Commands::Run { prompt }) => {
            let store = store::connect(config.database_path);
            let orchestrator = Orchestrator::new(
                store,
                IntegrationClient::new(config.integrations),
                config.pipeline,
            );

            let report = orchestrator.execute(&PipelineRequest::new(prompt)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::Stats) => {
            let stats = store::connect(config.database_path).feature_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        None => serve(config, "127.0.0.1", 3000).await?,
    }

    Ok(())
}

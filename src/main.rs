// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! wcagbot CLI and server entry point

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wcagbot::api::{self, AppState};
use wcagbot::render::AnalysisRequest;
use wcagbot::report::render_text;
use wcagbot::{store, AnalysisPipeline, Config};

#[derive(Parser)]
#[command(name = "wcagbot")]
#[command(about = "WCAG 2.1 AA accessibility analysis service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "wcagbot.toml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze one page or HTML file and print the report
    Analyze {
        /// Page URL to render and analyze
        #[arg(long, conflicts_with = "html_file", required_unless_present = "html_file")]
        url: Option<String>,

        /// Local HTML file to analyze as submitted markup
        #[arg(long)]
        html_file: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Report JSON, as returned by the API
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load config
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            tracing::info!("Starting wcagbot server on {}:{}", host, port);
            serve(&config, &host, port).await
        }
        Commands::Analyze {
            url,
            html_file,
            format,
            output,
        } => analyze(&config, url, html_file, format, output).await,
    }
}

async fn serve(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let pipeline = Arc::new(AnalysisPipeline::from_config(config)?);
    let store = store::connect(&config.database).await;

    let app = api::router(AppState { pipeline, store }, &config.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;
    tracing::info!("Listening on http://{}:{}", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn analyze(
    config: &Config,
    url: Option<String>,
    html_file: Option<PathBuf>,
    format: FormatArg,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let request = match (url, html_file) {
        (Some(url), _) => AnalysisRequest::url(url),
        (None, Some(path)) => {
            let markup = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            AnalysisRequest::html(markup)
        }
        (None, None) => anyhow::bail!("either --url or --html-file is required"),
    };

    let pipeline = AnalysisPipeline::from_config(config)?;
    let report = match pipeline.analyze(&request).await {
        Ok(report) => report,
        Err(e) => anyhow::bail!("{}", e.user_message()),
    };

    let rendered = match format {
        FormatArg::Text => render_text(&report),
        FormatArg::Json => serde_json::to_string_pretty(&report)?,
    };

    match output {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

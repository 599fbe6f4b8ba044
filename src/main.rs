//! Finalyze - Main Entry Point
//!
//! Scenario store and mass-fetch client for the analytics page.

fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting finalyze...");

    finalyze::cli::run()
}

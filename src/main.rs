use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt};

use crate::completion::{
    ArtifactPublisher, CompletionReporter, ConsoleReporter, GitPublisher, NoopPublisher, NoopReporter,
};
use crate::config::Settings;

// Declare modules
mod color;
mod completion;
mod config;
mod error;
mod models;
mod pipeline;
mod pricerunner_api;
mod report;
#[cfg(test)]
mod test_support;

// Brand name is only used for the output file name and the commit message
fn prompt_brand_name() -> Result<String> {
    print!("Ange varumärkets namn: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read brand name from stdin")?;

    let brand = line.trim().to_string();
    if brand.is_empty() {
        bail!("Brand name must not be empty");
    }
    Ok(brand)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pricerunner_rust=info".into())) // Default to info if RUST_LOG not set
        .with(fmt::layer())
        .init();

    // Load configuration
    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let brand_name = match settings.brand_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => prompt_brand_name()?,
    };

    let reporter: Box<dyn CompletionReporter> = if settings.notify {
        Box::new(ConsoleReporter)
    } else {
        Box::new(NoopReporter)
    };
    let publisher: Box<dyn ArtifactPublisher> = if settings.publish {
        Box::new(GitPublisher {
            remote: settings.git_remote.clone(),
            branch: settings.git_branch.clone(),
        })
    } else {
        Box::new(NoopPublisher)
    };

    tracing::info!(
        brand = %brand_name,
        policy = ?settings.color_policy,
        "Starting PriceRunner offer export"
    );
    if let Err(e) =
        pipeline::run_export(&settings, &brand_name, reporter.as_ref(), publisher.as_ref()).await
    {
        tracing::error!("Export failed: {:?}", e);
        return Err(e);
    }

    Ok(())
}

// Hooks that run once after the report is written: telling the operator and
// publishing the result. Both are swappable so tests and dry runs skip them.

use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use crate::pipeline::RunSummary;

#[async_trait]
pub trait CompletionReporter: Send + Sync {
    async fn report(&self, output: &Path, summary: &RunSummary) -> Result<()>;
}

#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    async fn publish(&self, output: &Path, brand_name: &str) -> Result<()>;
}

/// Prints where the report went and rings the terminal bell.
pub struct ConsoleReporter;

#[async_trait]
impl CompletionReporter for ConsoleReporter {
    async fn report(&self, output: &Path, summary: &RunSummary) -> Result<()> {
        println!(
            "Processing finished: {} input rows, {} output rows ({} without offers). Output saved to: {}\x07",
            summary.input_rows,
            summary.output_rows,
            summary.placeholder_rows,
            output.display()
        );
        Ok(())
    }
}

pub struct NoopReporter;

#[async_trait]
impl CompletionReporter for NoopReporter {
    async fn report(&self, _output: &Path, _summary: &RunSummary) -> Result<()> {
        Ok(())
    }
}

/// Stages, commits and pushes the working directory.
pub struct GitPublisher {
    pub remote: String,
    pub branch: String,
}

impl GitPublisher {
    pub fn commit_message(brand_name: &str) -> String {
        format!("Automatisk commit från {} script run", brand_name)
    }

    async fn git(&self, args: &[&str]) -> Result<()> {
        tracing::info!(args = ?args, "Running git");
        let status = Command::new("git")
            .args(args)
            .status()
            .await
            .with_context(|| format!("Failed to run git {:?}", args))?;
        if !status.success() {
            bail!("git {:?} exited with {}", args, status);
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactPublisher for GitPublisher {
    async fn publish(&self, output: &Path, brand_name: &str) -> Result<()> {
        tracing::info!(output = %output.display(), remote = %self.remote, branch = %self.branch, "Pushing changes");
        let message = Self::commit_message(brand_name);
        self.git(&["add", "."]).await?;
        self.git(&["commit", "-m", &message]).await?;
        self.git(&["push", &self.remote, &self.branch]).await?;
        tracing::info!("Changes pushed");
        Ok(())
    }
}

pub struct NoopPublisher;

#[async_trait]
impl ArtifactPublisher for NoopPublisher {
    async fn publish(&self, output: &Path, _brand_name: &str) -> Result<()> {
        tracing::debug!(output = %output.display(), "Publishing disabled");
        Ok(())
    }
}

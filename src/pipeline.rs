// Row-by-row driver: EAN -> product id -> offers -> report rows.
// Strictly sequential with a random politeness delay between rows.

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use rand::Rng;
use tokio::time::sleep;

use crate::{
    color::ColorClassifier,
    completion::{ArtifactPublisher, CompletionReporter},
    config::Settings,
    models::Offer,
    pricerunner_api::PriceRunnerClient,
    report::{output_path, InputReader, InputRow, ReportWriter},
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub input_rows: usize,
    pub output_rows: usize,
    pub rows_with_offers: usize,
    pub placeholder_rows: usize,
}

/// Uniform whole-second delay drawn from an inclusive range.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    min_secs: u64,
    max_secs: u64,
}

impl Throttle {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs: min_secs.min(max_secs),
            max_secs,
        }
    }

    pub fn next_delay(&self) -> Duration {
        Duration::from_secs(rand::rng().random_range(self.min_secs..=self.max_secs))
    }

    async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::debug!(delay_secs = delay.as_secs(), "Throttling");
            sleep(delay).await;
        }
    }
}

pub struct Pipeline {
    client: PriceRunnerClient,
    classifier: ColorClassifier,
    throttle: Throttle,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Result<Self> {
        settings.validate().context("Invalid settings")?;
        let classifier = ColorClassifier::new(
            settings.color_policy,
            settings.color_language,
            settings.match_english_names,
        )
        .context("Failed to build color vocabulary")?;

        Ok(Self {
            client: PriceRunnerClient::new(settings)?,
            classifier,
            throttle: Throttle::new(settings.throttle_min_secs, settings.throttle_max_secs),
        })
    }

    /// Looks up every input row and writes one report row per offer, or a
    /// single placeholder row when nothing usable came back.
    pub async fn run<R: Read, W: Write>(
        &self,
        input: &mut InputReader<R>,
        report: &mut ReportWriter<W>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (index, row) in input.rows().enumerate() {
            let row = row?;
            if index > 0 {
                self.throttle.wait().await;
            }

            tracing::info!(
                ean = %row.ean,
                expected_color = ?row.brand_color,
                "Fetching offers"
            );
            let offers = self.lookup_offers(&row).await;

            if offers.is_empty() {
                report.write_placeholder(&row)?;
                summary.placeholder_rows += 1;
            } else {
                for offer in &offers {
                    report.write_offer(&row, offer)?;
                }
                summary.rows_with_offers += 1;
            }
            report.flush()?;

            summary.input_rows += 1;
            tracing::info!(ean = %row.ean, offers = offers.len(), "Row done");
        }

        summary.output_rows = report.rows_written();
        Ok(summary)
    }

    /// Every failure on the way is logged and collapses to "no offers".
    pub async fn lookup_offers(&self, row: &InputRow) -> Vec<Offer> {
        if row.ean.is_empty() {
            tracing::warn!("Row has an empty EAN, skipping lookup");
            return Vec::new();
        }

        let product_id = match self.client.fetch_product_id(&row.ean).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::info!(ean = %row.ean, "No product found");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(ean = %row.ean, error = %e, "Failed to retrieve product ID");
                return Vec::new();
            }
        };

        match self
            .client
            .fetch_offers(&product_id, &self.classifier, row.brand_color.as_deref())
            .await
        {
            Ok(offers) => offers,
            Err(e) => {
                tracing::warn!(ean = %row.ean, product_id = %product_id, error = %e, "Failed to retrieve offers");
                Vec::new()
            }
        }
    }
}

/// Full run: read the input list, write the dated report, then fire the
/// completion hooks. Returns the path of the written report.
pub async fn run_export(
    settings: &Settings,
    brand_name: &str,
    reporter: &dyn CompletionReporter,
    publisher: &dyn ArtifactPublisher,
) -> Result<(PathBuf, RunSummary)> {
    let pipeline = Pipeline::new(settings)?;

    let mut input = InputReader::open(&settings.input_path)?;
    let output = output_path(&settings.output_dir, brand_name, chrono::Local::now().date_naive());
    let mut report = ReportWriter::create(&output, input.headers())?;
    tracing::info!(input = %settings.input_path.display(), output = %output.display(), "Starting export");

    let summary = pipeline.run(&mut input, &mut report).await?;
    report.into_inner()?;
    tracing::info!(?summary, output = %output.display(), "Export finished");

    finish(&output, brand_name, &summary, reporter, publisher).await;
    Ok((output, summary))
}

// Hook failures never invalidate a report that is already on disk
async fn finish(
    output: &Path,
    brand_name: &str,
    summary: &RunSummary,
    reporter: &dyn CompletionReporter,
    publisher: &dyn ArtifactPublisher,
) {
    if let Err(e) = reporter.report(output, summary).await {
        tracing::warn!(error = %e, "Completion report failed");
    }
    if let Err(e) = publisher.publish(output, brand_name).await {
        tracing::error!(error = ?e, "Publishing the report failed");
    }
}

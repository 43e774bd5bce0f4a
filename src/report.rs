// CSV input list and the augmented offer report.

use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};

use crate::models::{Offer, NOT_SURE, NO_OFFER_ID, NO_PRODUCT_FOUND};

pub const EAN_COLUMN: &str = "EAN";
pub const BRAND_COLOR_COLUMN: &str = "Brand Color";
pub const DERIVED_COLUMNS: [&str; 4] = ["BrandName", "Sell Price", "Color", "Offer ID"];

/// One line of the input list, padded to the header width.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub fields: Vec<String>,
    pub ean: String,
    pub brand_color: Option<String>,
}

pub struct InputReader<R: Read> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    ean_index: usize,
    color_index: Option<usize>,
}

impl InputReader<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("Invalid input file {}", path.display()))
    }
}

impl<R: Read> InputReader<R> {
    pub fn from_reader(source: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
        let headers = reader.headers().context("Failed to read CSV header")?.clone();

        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let Some(ean_index) = find(EAN_COLUMN) else {
            bail!("input header has no '{}' column: {:?}", EAN_COLUMN, headers);
        };
        let color_index = find(BRAND_COLOR_COLUMN);

        Ok(Self {
            reader,
            headers,
            ean_index,
            color_index,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&mut self) -> impl Iterator<Item = Result<InputRow>> + '_ {
        let width = self.headers.len();
        let ean_index = self.ean_index;
        let color_index = self.color_index;

        self.reader.records().enumerate().map(move |(i, record)| {
            let record = record.with_context(|| format!("Failed to read input row {}", i + 1))?;
            if record.len() > width {
                tracing::warn!(row = i + 1, fields = record.len(), width, "Dropping cells beyond the header");
            }

            let mut fields: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            fields.resize(width, String::new());

            let ean = fields[ean_index].trim().to_string();
            let brand_color = color_index
                .map(|idx| fields[idx].trim().to_string())
                .filter(|c| !c.is_empty());

            Ok(InputRow {
                fields,
                ean,
                brand_color,
            })
        })
    }
}

pub struct ReportWriter<W: Write> {
    writer: Writer<W>,
    rows_written: usize,
}

impl ReportWriter<File> {
    pub fn create(path: &Path, input_headers: &StringRecord) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Self::from_writer(file, input_headers)
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn from_writer(sink: W, input_headers: &StringRecord) -> Result<Self> {
        let mut writer = WriterBuilder::new().from_writer(sink);
        let header = input_headers.iter().chain(DERIVED_COLUMNS);
        writer.write_record(header).context("Failed to write CSV header")?;
        writer.flush()?;
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    pub fn write_offer(&mut self, row: &InputRow, offer: &Offer) -> Result<()> {
        let price = offer.price.to_string();
        self.write_row(
            row,
            [
                offer.merchant_name.as_str(),
                price.as_str(),
                offer.color.as_str(),
                offer.offer_id.as_str(),
            ],
        )
    }

    /// The single row emitted when a lookup produced no offers.
    pub fn write_placeholder(&mut self, row: &InputRow) -> Result<()> {
        self.write_row(row, [NO_PRODUCT_FOUND, "", NOT_SURE, NO_OFFER_ID])
    }

    // Called once per input row so an interrupted run keeps what it has
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush output file")
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish output: {}", e.error()))
    }

    fn write_row(&mut self, row: &InputRow, derived: [&str; 4]) -> Result<()> {
        let record = row.fields.iter().map(String::as_str).chain(derived);
        self.writer.write_record(record).context("Failed to write output row")?;
        self.rows_written += 1;
        Ok(())
    }
}

/// `{dir}/{brand} - Output ({YYYY-MM-DD}).csv`
pub fn output_path(dir: &Path, brand_name: &str, date: NaiveDate) -> PathBuf {
    let brand: String = brand_name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    dir.join(format!("{} - Output ({}).csv", brand, date.format("%Y-%m-%d")))
}

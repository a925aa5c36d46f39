//! CSV observation reader and evaluation row writer.
//!
//! Input files carry a `timestamp,price` header; output files carry one column
//! per [`EvaluationRow`] field.

use crate::domain::error::PsaError;
use crate::domain::observation::{EvaluationRow, ObservationRow, PortfolioEvaluation};
use crate::domain::validation::parse_timestamp;
use crate::ports::observation_port::ObservationSource;
use crate::ports::report_port::ReportPort;
use chrono::SecondsFormat;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub struct CsvObservationSource {
    path: PathBuf,
}

impl CsvObservationSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Parse `timestamp,price` records. Rows keep file order.
pub fn parse_observation_csv(content: &str) -> Result<Vec<ObservationRow>, PsaError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| PsaError::Csv {
            reason: format!("parse error: {}", e),
        })?;
        // Header is line 1.
        let line = idx + 2;

        let ts_str = record.get(0).ok_or_else(|| PsaError::Csv {
            reason: format!("line {}: missing timestamp column", line),
        })?;
        let timestamp = parse_timestamp(ts_str)?;

        let price: f64 = record
            .get(1)
            .ok_or_else(|| PsaError::Csv {
                reason: format!("line {}: missing price column", line),
            })?
            .parse()
            .map_err(|e| PsaError::Csv {
                reason: format!("line {}: invalid price value: {}", line, e),
            })?;

        rows.push(ObservationRow::new(timestamp, price));
    }

    Ok(rows)
}

impl ObservationSource for CsvObservationSource {
    fn load_rows(&self) -> Result<Vec<ObservationRow>, PsaError> {
        let content = fs::read_to_string(&self.path)?;
        parse_observation_csv(&content)
    }
}

pub struct CsvReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvReportWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn into_inner(self) -> Result<W, PsaError> {
        self.writer.into_inner().map_err(|e| PsaError::Csv {
            reason: format!("flush failed: {}", e),
        })
    }
}

impl<W: Write> ReportPort for CsvReportWriter<W> {
    fn write_rows(&mut self, rows: &[EvaluationRow]) -> Result<(), PsaError> {
        let csv_err = |e: csv::Error| PsaError::Csv {
            reason: format!("write error: {}", e),
        };

        self.writer
            .write_record([
                "timestamp",
                "price",
                "time_k",
                "virtual_price",
                "base_share",
                "target_share",
            ])
            .map_err(csv_err)?;

        for row in rows {
            self.writer
                .write_record([
                    row.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                    row.price.to_string(),
                    row.time_k.to_string(),
                    row.virtual_price.to_string(),
                    row.base_share.to_string(),
                    row.target_share.to_string(),
                ])
                .map_err(csv_err)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_portfolio(&mut self, evaluation: &PortfolioEvaluation) -> Result<(), PsaError> {
        let csv_err = |e: csv::Error| PsaError::Csv {
            reason: format!("write error: {}", e),
        };
        let optional = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

        self.writer
            .write_record(PORTFOLIO_COLUMNS)
            .map_err(csv_err)?;
        self.writer
            .write_record([
                evaluation
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                evaluation.price.to_string(),
                evaluation.time_k.to_string(),
                evaluation.virtual_price.to_string(),
                evaluation.base_share.to_string(),
                evaluation.target_share.to_string(),
                evaluation.current_share.to_string(),
                evaluation.share_deviation.to_string(),
                evaluation.portfolio_value_usd.to_string(),
                evaluation.asset_value_usd.to_string(),
                evaluation.usd_value_usd.to_string(),
                evaluation.target_asset_value_usd.to_string(),
                evaluation.target_asset_amount.to_string(),
                evaluation.asset_amount_delta.to_string(),
                evaluation.usd_delta.to_string(),
                optional(evaluation.alignment_price),
                optional(evaluation.avg_entry_price),
                optional(evaluation.avg_entry_pnl_usd),
                optional(evaluation.avg_entry_pnl_pct),
            ])
            .map_err(csv_err)?;
        self.writer.flush()?;
        Ok(())
    }
}

const PORTFOLIO_COLUMNS: [&str; 19] = [
    "timestamp",
    "price",
    "time_k",
    "virtual_price",
    "base_share",
    "target_share",
    "current_share",
    "share_deviation",
    "portfolio_value_usd",
    "asset_value_usd",
    "usd_value_usd",
    "target_asset_value_usd",
    "target_asset_amount",
    "asset_amount_delta",
    "usd_delta",
    "alignment_price",
    "avg_entry_price",
    "avg_entry_pnl_usd",
    "avg_entry_pnl_pct",
];

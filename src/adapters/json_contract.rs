//! JSON request contract and response encoding.
//!
//! Turns loosely-typed `serde_json::Value` payloads into the typed domain
//! model with field-named errors, and serialises results back. Shape and type
//! problems are `PsaError::Contract`; everything semantic is delegated to the
//! domain validators.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::io::Write;

use crate::domain::error::{PsaError, ValidationError};
use crate::domain::evaluation::{
    RangeRequest, evaluate_point, evaluate_rows, evaluate_rows_from_ranges,
};
use crate::domain::observation::{
    EvaluationRow, ObservationRow, PortfolioEvaluation, PortfolioObservation,
};
use crate::domain::portfolio::evaluate_portfolio_with;
use crate::domain::alignment::AlignmentConfig;
use crate::domain::strategy::{PriceSegment, StrategySpec, TimeSegment};
use crate::domain::validation::{parse_timestamp, validate_market_mode, validate_strategy};
use crate::ports::report_port::ReportPort;

pub fn parse_json(text: &str, source_name: &str) -> Result<Value, PsaError> {
    serde_json::from_str(text).map_err(|e| PsaError::Json {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })
}

fn ensure_object<'a>(value: &'a Value, name: &str) -> Result<&'a Map<String, Value>, PsaError> {
    value
        .as_object()
        .ok_or_else(|| PsaError::contract(name, "must be an object"))
}

fn ensure_array<'a>(value: Option<&'a Value>, name: &str) -> Result<&'a Vec<Value>, PsaError> {
    value
        .and_then(Value::as_array)
        .ok_or_else(|| PsaError::contract(name, "must be an array"))
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, PsaError> {
    obj.get(key)
        .ok_or_else(|| PsaError::contract(key, "missing required field"))
}

fn float_field(obj: &Map<String, Value>, key: &str) -> Result<f64, PsaError> {
    required(obj, key)?
        .as_f64()
        .ok_or_else(|| PsaError::contract(key, "must be numeric"))
}

fn optional_float_field(obj: &Map<String, Value>, key: &str) -> Result<Option<f64>, PsaError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| PsaError::contract(key, "must be numeric or null")),
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, PsaError> {
    required(obj, key)?
        .as_str()
        .ok_or_else(|| PsaError::contract(key, "must be a string"))
}

/// Step counts: JSON integers only. Booleans and floats are contract errors;
/// integers below 1 are semantic errors.
fn steps_field(obj: &Map<String, Value>, key: &str) -> Result<usize, PsaError> {
    let value = required(obj, key)?;
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).map_err(|_| PsaError::contract(key, "is too large"));
    }
    if value.is_i64() {
        return Err(ValidationError::InvalidSteps {
            field: key.to_string(),
        }
        .into());
    }
    Err(PsaError::contract(key, "must be an integer"))
}

fn bool_field(obj: &Map<String, Value>, key: &str, default: bool) -> Result<bool, PsaError> {
    match obj.get(key) {
        None => Ok(default),
        Some(v) => v
            .as_bool()
            .ok_or_else(|| PsaError::contract(key, "must be a boolean")),
    }
}

fn timestamp_field(
    obj: &Map<String, Value>,
    key: &str,
) -> Result<chrono::DateTime<chrono::Utc>, PsaError> {
    Ok(parse_timestamp(str_field(obj, key)?)?)
}

/// Parse and validate a strategy object.
pub fn parse_strategy(value: &Value) -> Result<StrategySpec, PsaError> {
    let obj = ensure_object(value, "strategy")?;
    let market_mode = validate_market_mode(str_field(obj, "market_mode")?)?;

    let price_segments = ensure_array(obj.get("price_segments"), "price_segments")?
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let seg = ensure_object(item, &format!("price_segments[{idx}]"))?;
            Ok(PriceSegment::new(
                float_field(seg, "price_low")?,
                float_field(seg, "price_high")?,
                float_field(seg, "weight")?,
            ))
        })
        .collect::<Result<Vec<_>, PsaError>>()?;

    let time_segments = match obj.get("time_segments") {
        None | Some(Value::Null) => Vec::new(),
        raw => ensure_array(raw, "time_segments")?
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let seg = ensure_object(item, &format!("time_segments[{idx}]"))?;
                Ok(TimeSegment::new(
                    timestamp_field(seg, "start_ts")?,
                    timestamp_field(seg, "end_ts")?,
                    float_field(seg, "k_start")?,
                    float_field(seg, "k_end")?,
                ))
            })
            .collect::<Result<Vec<_>, PsaError>>()?,
    };

    let strategy = StrategySpec::new(market_mode, price_segments).with_time_segments(time_segments);
    validate_strategy(&strategy)?;
    Ok(strategy)
}

fn request_strategy(obj: &Map<String, Value>) -> Result<StrategySpec, PsaError> {
    parse_strategy(required(obj, "strategy")?)
}

pub fn parse_observation_row(value: &Value) -> Result<ObservationRow, PsaError> {
    let obj = ensure_object(value, "row")?;
    Ok(ObservationRow::new(
        timestamp_field(obj, "timestamp")?,
        float_field(obj, "price")?,
    ))
}

pub fn read_point_request(payload: &Value) -> Result<(StrategySpec, ObservationRow), PsaError> {
    let obj = ensure_object(payload, "request")?;
    let strategy = request_strategy(obj)?;
    Ok((strategy, parse_observation_row(payload)?))
}

pub fn read_rows_request(
    payload: &Value,
) -> Result<(StrategySpec, Vec<ObservationRow>), PsaError> {
    let obj = ensure_object(payload, "request")?;
    let strategy = request_strategy(obj)?;
    let rows = ensure_array(obj.get("rows"), "rows")?
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            ensure_object(item, &format!("rows[{idx}]"))?;
            parse_observation_row(item)
        })
        .collect::<Result<Vec<_>, PsaError>>()?;
    Ok((strategy, rows))
}

pub fn read_ranges_request(payload: &Value) -> Result<(StrategySpec, RangeRequest), PsaError> {
    let obj = ensure_object(payload, "request")?;
    let strategy = request_strategy(obj)?;
    let request = RangeRequest {
        price_start: float_field(obj, "price_start")?,
        price_end: float_field(obj, "price_end")?,
        price_steps: steps_field(obj, "price_steps")?,
        time_start: timestamp_field(obj, "time_start")?,
        time_end: timestamp_field(obj, "time_end")?,
        time_steps: steps_field(obj, "time_steps")?,
        include_price_breakpoints: bool_field(obj, "include_price_breakpoints", true)?,
    };
    Ok((strategy, request))
}

pub fn read_portfolio_request(
    payload: &Value,
) -> Result<(StrategySpec, PortfolioObservation), PsaError> {
    let obj = ensure_object(payload, "request")?;
    let strategy = request_strategy(obj)?;
    let observation = PortfolioObservation {
        timestamp: timestamp_field(obj, "timestamp")?,
        price: float_field(obj, "price")?,
        usd_amount: float_field(obj, "usd_amount")?,
        asset_amount: float_field(obj, "asset_amount")?,
        avg_entry_price: optional_float_field(obj, "avg_entry_price")?,
        alignment_search_min_price: optional_float_field(obj, "alignment_search_min_price")?,
        alignment_search_max_price: optional_float_field(obj, "alignment_search_max_price")?,
    };
    Ok((strategy, observation))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, PsaError> {
    serde_json::to_value(value).map_err(|e| PsaError::Json {
        source_name: "response".to_string(),
        reason: e.to_string(),
    })
}

pub fn evaluate_point_payload(payload: &Value) -> Result<Value, PsaError> {
    let (strategy, row) = read_point_request(payload)?;
    let evaluated = evaluate_point(&strategy, row.timestamp, row.price)?;
    Ok(json!({ "row": to_value(&evaluated)? }))
}

pub fn evaluate_rows_payload(payload: &Value) -> Result<Value, PsaError> {
    let (strategy, rows) = read_rows_request(payload)?;
    let evaluated = evaluate_rows(&strategy, &rows)?;
    Ok(json!({ "rows": to_value(&evaluated)? }))
}

pub fn evaluate_rows_from_ranges_payload(payload: &Value) -> Result<Value, PsaError> {
    let (strategy, request) = read_ranges_request(payload)?;
    let evaluated = evaluate_rows_from_ranges(&strategy, &request)?;
    Ok(json!({ "rows": to_value(&evaluated)? }))
}

pub fn evaluate_portfolio_payload(
    payload: &Value,
    config: &AlignmentConfig,
) -> Result<Value, PsaError> {
    let (strategy, observation) = read_portfolio_request(payload)?;
    let evaluated = evaluate_portfolio_with(&strategy, &observation, config)?;
    Ok(json!({ "portfolio": to_value(&evaluated)? }))
}

/// Writes `{"rows": [...]}` or `{"portfolio": {...}}` documents.
pub struct JsonReportWriter<W: Write> {
    inner: W,
    pretty: bool,
}

impl<W: Write> JsonReportWriter<W> {
    pub fn new(inner: W, pretty: bool) -> Self {
        Self { inner, pretty }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn emit(&mut self, document: &Value) -> Result<(), PsaError> {
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut self.inner, document)
        } else {
            serde_json::to_writer(&mut self.inner, document)
        };
        result.map_err(|e| PsaError::Json {
            source_name: "output".to_string(),
            reason: e.to_string(),
        })?;
        writeln!(self.inner)?;
        Ok(())
    }
}

impl<W: Write> ReportPort for JsonReportWriter<W> {
    fn write_rows(&mut self, rows: &[EvaluationRow]) -> Result<(), PsaError> {
        let document = json!({ "rows": to_value(&rows)? });
        self.emit(&document)
    }

    fn write_portfolio(&mut self, evaluation: &PortfolioEvaluation) -> Result<(), PsaError> {
        let document = json!({ "portfolio": to_value(evaluation)? });
        self.emit(&document)
    }
}

//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::{CsvObservationSource, CsvReportWriter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_contract::{JsonReportWriter, parse_json, parse_strategy};
use crate::domain::alignment::AlignmentConfig;
use crate::domain::config_validation::{
    build_alignment_config, output_format, output_pretty, validate_engine_config,
};
use crate::domain::error::PsaError;
use crate::domain::evaluation::{RangeRequest, evaluate_point, evaluate_rows, evaluate_rows_from_ranges};
use crate::domain::observation::PortfolioObservation;
use crate::domain::portfolio::evaluate_portfolio_with;
use crate::domain::strategy::{PriceSegment, StrategySpec, TimeSegment};
use crate::domain::validation::{parse_timestamp, validate_market_mode, validate_strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::observation_port::ObservationSource;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "psa", about = "Price-share allocation engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a strategy and print a summary
    Validate {
        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Evaluate a strategy
    Evaluate {
        #[command(subcommand)]
        target: EvaluateCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum EvaluateCommand {
    /// Evaluate a single (timestamp, price) observation
    Point {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        timestamp: String,
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
    },
    /// Evaluate observations from a CSV file with a timestamp,price header
    Rows {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        rows: PathBuf,
    },
    /// Evaluate the cartesian grid of a price range and a time range
    Ranges {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, allow_negative_numbers = true)]
        price_start: f64,
        #[arg(long, allow_negative_numbers = true)]
        price_end: f64,
        #[arg(long)]
        price_steps: usize,
        #[arg(long)]
        time_start: String,
        #[arg(long)]
        time_end: String,
        #[arg(long)]
        time_steps: usize,
        /// Do not merge strategy breakpoints into the price axis
        #[arg(long)]
        no_breakpoints: bool,
    },
    /// Evaluate a live portfolio against the target allocation
    Portfolio {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        timestamp: String,
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
        #[arg(long, allow_negative_numbers = true)]
        usd_amount: f64,
        #[arg(long, allow_negative_numbers = true)]
        asset_amount: f64,
        #[arg(long, allow_negative_numbers = true)]
        avg_entry_price: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        search_min_price: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        search_max_price: Option<f64>,
    },
}

/// Where the strategy comes from: a JSON file or inline flags.
#[derive(Args, Debug, Clone, Default)]
pub struct StrategyArgs {
    /// Strategy JSON file
    #[arg(short, long, conflicts_with_all = ["market_mode", "price_segment", "time_segment"])]
    pub strategy: Option<PathBuf>,
    /// bear or bull
    #[arg(long)]
    pub market_mode: Option<String>,
    /// Price segment as low:high:weight (repeatable)
    #[arg(long = "price-segment")]
    pub price_segment: Vec<String>,
    /// Time segment as start,end,k_start,k_end (repeatable)
    #[arg(long = "time-segment")]
    pub time_segment: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,
    /// Engine INI file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Output encoding; overrides [output] format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

/// Everything the engine needs from the optional config file.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub alignment: AlignmentConfig,
    pub format: OutputFormat,
    pub pretty: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match &cli.command {
        Command::Validate { strategy } => run_validate(strategy, &mut out),
        Command::Evaluate { target } => run_evaluate(target, &mut out),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, PsaError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Validate the optional config file and resolve engine settings.
pub fn load_engine_settings(
    path: Option<&Path>,
    format_flag: Option<OutputFormat>,
) -> Result<EngineSettings, PsaError> {
    let adapter = match path {
        Some(p) => load_config(p)?,
        None => FileConfigAdapter::empty(),
    };
    validate_engine_config(&adapter)?;
    Ok(EngineSettings {
        alignment: build_alignment_config(&adapter)?,
        format: resolve_output_format(format_flag, &adapter)?,
        pretty: output_pretty(&adapter)?,
    })
}

/// Flag beats config; config beats the JSON default.
pub fn resolve_output_format(
    flag: Option<OutputFormat>,
    config: &dyn ConfigPort,
) -> Result<OutputFormat, PsaError> {
    if let Some(format) = flag {
        return Ok(format);
    }
    Ok(match output_format(config)?.as_deref() {
        Some("csv") => OutputFormat::Csv,
        _ => OutputFormat::Json,
    })
}

/// Parse `low:high:weight`.
pub fn parse_price_segment_arg(value: &str) -> Result<PriceSegment, PsaError> {
    let parts: Vec<&str> = value.split(':').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(argument_error(
            "--price-segment",
            format!("expected low:high:weight, got '{value}'"),
        ));
    }
    let number = |s: &str| {
        s.parse::<f64>().map_err(|e| {
            argument_error("--price-segment", format!("invalid number '{s}': {e}"))
        })
    };
    Ok(PriceSegment::new(
        number(parts[0])?,
        number(parts[1])?,
        number(parts[2])?,
    ))
}

/// Parse `start,end,k_start,k_end`.
pub fn parse_time_segment_arg(value: &str) -> Result<TimeSegment, PsaError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(argument_error(
            "--time-segment",
            format!("expected start,end,k_start,k_end, got '{value}'"),
        ));
    }
    let number = |s: &str| {
        s.parse::<f64>().map_err(|e| {
            argument_error("--time-segment", format!("invalid number '{s}': {e}"))
        })
    };
    Ok(TimeSegment::new(
        parse_timestamp(parts[0])?,
        parse_timestamp(parts[1])?,
        number(parts[2])?,
        number(parts[3])?,
    ))
}

fn argument_error(argument: &str, reason: String) -> PsaError {
    PsaError::Argument {
        argument: argument.to_string(),
        reason,
    }
}

/// Load the strategy from `--strategy` or build it from inline flags.
///
/// A strategy file may hold the strategy object itself or a request-shaped
/// object with a `strategy` field.
pub fn resolve_strategy(args: &StrategyArgs) -> Result<StrategySpec, PsaError> {
    if let Some(path) = &args.strategy {
        info!("Loading strategy from {}", path.display());
        let text = fs::read_to_string(path)?;
        let value = parse_json(&text, &path.display().to_string())?;
        return match value.get("strategy") {
            Some(inner) => parse_strategy(inner),
            None => parse_strategy(&value),
        };
    }

    let mode = args.market_mode.as_deref().ok_or_else(|| {
        argument_error(
            "--market-mode",
            "required when --strategy is not given".to_string(),
        )
    })?;
    let market_mode = validate_market_mode(mode)?;
    let price_segments = args
        .price_segment
        .iter()
        .map(|s| parse_price_segment_arg(s))
        .collect::<Result<Vec<_>, _>>()?;
    let time_segments = args
        .time_segment
        .iter()
        .map(|s| parse_time_segment_arg(s))
        .collect::<Result<Vec<_>, _>>()?;

    let strategy = StrategySpec::new(market_mode, price_segments).with_time_segments(time_segments);
    validate_strategy(&strategy)?;
    Ok(strategy)
}

pub fn run_validate<W: Write>(args: &StrategyArgs, out: &mut W) -> Result<(), PsaError> {
    let strategy = resolve_strategy(args)?;
    info!("Strategy is valid");
    writeln!(out, "market_mode:    {}", strategy.market_mode)?;
    writeln!(out, "price_segments: {}", strategy.price_segments.len())?;
    if let (Some(low), Some(high)) = (strategy.min_price_low(), strategy.max_price_high()) {
        writeln!(out, "price_range:    {} .. {}", low, high)?;
    }
    writeln!(out, "time_segments:  {}", strategy.time_segments.len())?;
    Ok(())
}

fn report_writer<'a, W: Write>(
    settings: &EngineSettings,
    out: &'a mut W,
) -> Box<dyn ReportPort + 'a> {
    match settings.format {
        OutputFormat::Json => Box::new(JsonReportWriter::new(out, settings.pretty)),
        OutputFormat::Csv => Box::new(CsvReportWriter::new(out)),
    }
}

pub fn run_evaluate<W: Write>(command: &EvaluateCommand, out: &mut W) -> Result<(), PsaError> {
    match command {
        EvaluateCommand::Point {
            common,
            timestamp,
            price,
        } => {
            let (strategy, settings) = prepare(common)?;
            let row = evaluate_point(&strategy, parse_timestamp(timestamp)?, *price)?;
            report_writer(&settings, out).write_rows(&[row])
        }
        EvaluateCommand::Rows { common, rows } => {
            let (strategy, settings) = prepare(common)?;
            let observations = CsvObservationSource::new(rows.clone()).load_rows()?;
            info!("Evaluating {} rows", observations.len());
            let evaluated = evaluate_rows(&strategy, &observations)?;
            report_writer(&settings, out).write_rows(&evaluated)
        }
        EvaluateCommand::Ranges {
            common,
            price_start,
            price_end,
            price_steps,
            time_start,
            time_end,
            time_steps,
            no_breakpoints,
        } => {
            let (strategy, settings) = prepare(common)?;
            let mut request = RangeRequest::new(
                *price_start,
                *price_end,
                *price_steps,
                parse_timestamp(time_start)?,
                parse_timestamp(time_end)?,
                *time_steps,
            );
            if *no_breakpoints {
                request = request.without_breakpoints();
            }
            let evaluated = evaluate_rows_from_ranges(&strategy, &request)?;
            info!("Evaluated {} grid rows", evaluated.len());
            report_writer(&settings, out).write_rows(&evaluated)
        }
        EvaluateCommand::Portfolio {
            common,
            timestamp,
            price,
            usd_amount,
            asset_amount,
            avg_entry_price,
            search_min_price,
            search_max_price,
        } => {
            let (strategy, settings) = prepare(common)?;
            let mut observation = PortfolioObservation::new(
                parse_timestamp(timestamp)?,
                *price,
                *usd_amount,
                *asset_amount,
            )
            .with_search_bounds(*search_min_price, *search_max_price);
            if let Some(avg) = avg_entry_price {
                observation = observation.with_avg_entry_price(*avg);
            }
            let evaluation = evaluate_portfolio_with(&strategy, &observation, &settings.alignment)?;
            if evaluation.alignment_price.is_none() {
                info!("No alignment price inside the search bounds");
            }
            report_writer(&settings, out).write_portfolio(&evaluation)
        }
    }
}

fn prepare(common: &CommonArgs) -> Result<(StrategySpec, EngineSettings), PsaError> {
    let settings = load_engine_settings(common.config.as_deref(), common.format)?;
    let strategy = resolve_strategy(&common.strategy)?;
    Ok((strategy, settings))
}

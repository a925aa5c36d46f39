//! Engine configuration validation.
//!
//! Reads the optional `[alignment]` and `[output]` sections. Absent keys take
//! their defaults; present keys must parse and fall inside their ranges.

use crate::domain::alignment::AlignmentConfig;
use crate::domain::error::PsaError;
use crate::ports::config_port::ConfigPort;

pub const ALIGNMENT_SECTION: &str = "alignment";
pub const OUTPUT_SECTION: &str = "output";

pub const OUTPUT_FORMATS: [&str; 2] = ["json", "csv"];

/// Check every engine key without keeping the result.
pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), PsaError> {
    build_alignment_config(config)?;
    output_format(config)?;
    output_pretty(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> PsaError {
    PsaError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn alignment_int(config: &dyn ConfigPort, key: &str, default: usize) -> Result<i64, PsaError> {
    config
        .get_int(ALIGNMENT_SECTION, key)
        .map_err(|reason| invalid(ALIGNMENT_SECTION, key, &reason))
        .map(|v| v.unwrap_or(default as i64))
}

fn alignment_double(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, PsaError> {
    config
        .get_double(ALIGNMENT_SECTION, key)
        .map_err(|reason| invalid(ALIGNMENT_SECTION, key, &reason))
        .map(|v| v.unwrap_or(default))
}

/// Build the root-finder configuration from `[alignment]`.
pub fn build_alignment_config(config: &dyn ConfigPort) -> Result<AlignmentConfig, PsaError> {
    let defaults = AlignmentConfig::default();

    let grid_points = alignment_int(config, "grid_points", defaults.grid_points)?;
    if grid_points < 2 {
        return Err(invalid(
            ALIGNMENT_SECTION,
            "grid_points",
            "grid_points must be at least 2",
        ));
    }

    let max_iterations = alignment_int(config, "max_iterations", defaults.max_iterations)?;
    if max_iterations < 1 {
        return Err(invalid(
            ALIGNMENT_SECTION,
            "max_iterations",
            "max_iterations must be at least 1",
        ));
    }

    let tolerance = alignment_double(config, "tolerance", defaults.tolerance)?;
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(invalid(
            ALIGNMENT_SECTION,
            "tolerance",
            "tolerance must be finite and non-negative",
        ));
    }

    let default_min_factor =
        alignment_double(config, "default_min_factor", defaults.default_min_factor)?;
    if !default_min_factor.is_finite() || default_min_factor <= 0.0 {
        return Err(invalid(
            ALIGNMENT_SECTION,
            "default_min_factor",
            "default_min_factor must be positive",
        ));
    }

    let default_max_factor =
        alignment_double(config, "default_max_factor", defaults.default_max_factor)?;
    if !default_max_factor.is_finite() || default_max_factor <= default_min_factor {
        return Err(invalid(
            ALIGNMENT_SECTION,
            "default_max_factor",
            "default_max_factor must be greater than default_min_factor",
        ));
    }

    Ok(AlignmentConfig {
        grid_points: grid_points as usize,
        max_iterations: max_iterations as usize,
        tolerance,
        default_min_factor,
        default_max_factor,
    })
}

/// `[output] format`, lowercased; `None` when absent.
pub fn output_format(config: &dyn ConfigPort) -> Result<Option<String>, PsaError> {
    match config.get_string(OUTPUT_SECTION, "format") {
        None => Ok(None),
        Some(raw) => {
            let format = raw.trim().to_lowercase();
            if OUTPUT_FORMATS.contains(&format.as_str()) {
                Ok(Some(format))
            } else {
                Err(invalid(
                    OUTPUT_SECTION,
                    "format",
                    "format must be one of json, csv",
                ))
            }
        }
    }
}

/// `[output] pretty`; defaults to compact JSON.
pub fn output_pretty(config: &dyn ConfigPort) -> Result<bool, PsaError> {
    config
        .get_bool(OUTPUT_SECTION, "pretty")
        .map_err(|reason| invalid(OUTPUT_SECTION, "pretty", &reason))
        .map(|v| v.unwrap_or(false))
}

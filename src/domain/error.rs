//! Error types: the engine's semantic validation taxonomy and the
//! boundary-level error that wraps it.

/// Semantic validation failure raised by the engine before any computation.
///
/// This is the only way an engine operation fails. "No alignment price" is
/// not an error and never appears here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("market_mode must be one of {{'bear', 'bull'}}, got '{0}'")]
    InvalidMarketMode(String),

    #[error("price_segments must contain at least one segment")]
    EmptyPriceSegments,

    #[error("price_segments[{index}] must satisfy price_low < price_high")]
    InvertedPriceSegment { index: usize },

    #[error("price_segments[{index}].weight must be >= 0")]
    NegativeWeight { index: usize },

    #[error("price_segments total weight must be > 0")]
    ZeroTotalWeight,

    #[error("price_segments must not overlap")]
    OverlappingPriceSegments,

    #[error("time_segments[{index}] must satisfy start_ts < end_ts")]
    InvertedTimeSegment { index: usize },

    #[error("time_segments[{index}] requires k_start > 0 and k_end > 0")]
    NonPositiveCoefficient { index: usize },

    #[error("time_segments must not overlap")]
    OverlappingTimeSegments,

    #[error("{field} must be finite")]
    NonFinite { field: String },

    #[error("{field} must be > 0")]
    NonPositive { field: String },

    #[error("{field} must be >= 0")]
    Negative { field: String },

    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("{field} must be an integer >= 1")]
    InvalidSteps { field: String },

    #[error("alignment_search_min_price must be < alignment_search_max_price ({min} >= {max})")]
    InvertedSearchBounds { min: f64, max: f64 },

    #[error("{field} defaults to {value} from the strategy's price extent and must be > 0; pass it explicitly")]
    UnusableDefaultBound { field: String, value: f64 },

    #[error("usd_amount and asset_amount cannot both be zero")]
    EmptyPortfolio,
}

/// Top-level error type for psa.
#[derive(Debug, thiserror::Error)]
pub enum PsaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid argument {argument}: {reason}")]
    Argument { argument: String, reason: String },

    #[error("contract error in {field}: {reason}")]
    Contract { field: String, reason: String },

    #[error("invalid JSON in {source_name}: {reason}")]
    Json { source_name: String, reason: String },

    #[error("CSV error: {reason}")]
    Csv { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PsaError {
    pub(crate) fn contract(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PsaError::Contract {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl PsaError {
    /// Process exit status for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            PsaError::Io(_) => 1,
            PsaError::ConfigParse { .. }
            | PsaError::ConfigInvalid { .. }
            | PsaError::Argument { .. } => 2,
            PsaError::Json { .. } | PsaError::Csv { .. } | PsaError::Contract { .. } => 3,
            PsaError::Validation(_) => 4,
        }
    }
}

impl From<&PsaError> for std::process::ExitCode {
    fn from(err: &PsaError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

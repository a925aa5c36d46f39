//! Strategy evaluation engine. Pure functions over typed values; no I/O.

pub mod strategy;
pub mod observation;
pub mod validation;
pub mod price_share;
pub mod time_coefficient;
pub mod virtual_price;
pub mod evaluation;
pub mod alignment;
pub mod portfolio;
pub mod config_validation;
pub mod error;

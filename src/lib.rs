//! psa: price-share allocation engine.
//!
//! Evaluates a target asset share from a piecewise price profile and a
//! piecewise time coefficient, and aligns live portfolios against it.
//!
//! Hexagonal architecture: pure engine in [`domain`], port traits in [`ports`],
//! INI/CSV/JSON boundaries in [`adapters`], command-line surface in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

//! Observation input port trait.

use crate::domain::error::PsaError;
use crate::domain::observation::ObservationRow;

/// Supplies `(timestamp, price)` rows for batch evaluation, in the order they
/// should be evaluated.
pub trait ObservationSource {
    fn load_rows(&self) -> Result<Vec<ObservationRow>, PsaError>;
}

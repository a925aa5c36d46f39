//! Evaluation output port trait.

use crate::domain::error::PsaError;
use crate::domain::observation::{EvaluationRow, PortfolioEvaluation};

/// Port for writing evaluation results.
pub trait ReportPort {
    fn write_rows(&mut self, rows: &[EvaluationRow]) -> Result<(), PsaError>;

    /// Default implementation: writes the point-evaluation fields only.
    fn write_portfolio(&mut self, evaluation: &PortfolioEvaluation) -> Result<(), PsaError> {
        self.write_rows(&[evaluation.row()])
    }
}

//! Optional probability filter consulted before entries.

use crate::domain::error::RegimeTraderError;
use crate::domain::gate_features::GateFeatures;

pub trait CandidateGate {
    /// Ordered feature names the gate was built for.
    fn feature_names(&self) -> Vec<String>;

    /// Probability in `[0, 1]` that the candidate is worth entering.
    fn predict(&self, features: &GateFeatures) -> Result<f64, RegimeTraderError>;
}

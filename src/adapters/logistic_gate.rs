//! Logistic-regression candidate gate loaded from a CSV weight file.
//!
//! The file has the header `feature,weight,mean,scale`. One row per input
//! feature, in model order, plus a single `bias` row whose `weight` is the
//! intercept. Inputs are standardised as `(x - mean) / scale` before the
//! linear combination; a zero scale leaves the centred value unscaled.

use crate::domain::error::RegimeTraderError;
use crate::domain::gate_features::GateFeatures;
use crate::ports::candidate_gate::CandidateGate;
use std::fs;
use std::path::Path;

const BIAS_ROW: &str = "bias";

#[derive(Debug, Clone, PartialEq)]
struct Coefficient {
    feature: String,
    weight: f64,
    mean: f64,
    scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticGate {
    bias: f64,
    coefficients: Vec<Coefficient>,
}

fn gate_error(reason: impl Into<String>) -> RegimeTraderError {
    RegimeTraderError::Gate {
        reason: reason.into(),
    }
}

fn parse_number(record: &csv::StringRecord, index: usize, name: &str, line: usize) -> Result<f64, RegimeTraderError> {
    let raw = record
        .get(index)
        .ok_or_else(|| gate_error(format!("line {}: missing {} column", line, name)))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| gate_error(format!("line {}: invalid {} '{}': {}", line, name, raw, e)))?;
    if !value.is_finite() {
        return Err(gate_error(format!("line {}: {} is not finite", line, name)));
    }
    Ok(value)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticGate {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RegimeTraderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| gate_error(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_csv(&content)
    }

    pub fn from_csv(content: &str) -> Result<Self, RegimeTraderError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bias = None;
        let mut coefficients = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let line = i + 2;
            let record = result.map_err(|e| gate_error(format!("weight file parse error: {}", e)))?;
            let feature = record
                .get(0)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| gate_error(format!("line {}: missing feature name", line)))?;
            let weight = parse_number(&record, 1, "weight", line)?;

            if feature.eq_ignore_ascii_case(BIAS_ROW) {
                if bias.replace(weight).is_some() {
                    return Err(gate_error("duplicate bias row"));
                }
                continue;
            }
            if coefficients.iter().any(|c: &Coefficient| c.feature == feature) {
                return Err(gate_error(format!("duplicate feature '{}'", feature)));
            }
            coefficients.push(Coefficient {
                feature,
                weight,
                mean: parse_number(&record, 2, "mean", line)?,
                scale: parse_number(&record, 3, "scale", line)?,
            });
        }

        if coefficients.is_empty() {
            return Err(gate_error("weight file declares no features"));
        }
        Ok(Self {
            bias: bias.unwrap_or(0.0),
            coefficients,
        })
    }
}

impl CandidateGate for LogisticGate {
    fn feature_names(&self) -> Vec<String> {
        self.coefficients.iter().map(|c| c.feature.clone()).collect()
    }

    fn predict(&self, features: &GateFeatures) -> Result<f64, RegimeTraderError> {
        let values = features.to_vector();
        if values.len() != self.coefficients.len() {
            return Err(gate_error(format!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                values.len()
            )));
        }
        let z = self
            .coefficients
            .iter()
            .zip(values)
            .fold(self.bias, |acc, (c, x)| {
                let centred = x - c.mean;
                let standardised = if c.scale != 0.0 { centred / c.scale } else { centred };
                acc + c.weight * standardised
            });
        let p = sigmoid(z);
        if p.is_finite() {
            Ok(p)
        } else {
            Err(gate_error(format!("non-finite probability from logit {}", z)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gate_features::{validate_gate_schema, FIELD_NAMES};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn weight_file(bias: f64, weights: impl Fn(&str) -> (f64, f64, f64)) -> String {
        let mut out = String::from("feature,weight,mean,scale\n");
        out.push_str(&format!("bias,{},0,1\n", bias));
        for name in FIELD_NAMES {
            let (w, m, s) = weights(name);
            out.push_str(&format!("{},{},{},{}\n", name, w, m, s));
        }
        out
    }

    fn neutral_features() -> GateFeatures {
        GateFeatures {
            rsi: 50.0,
            vol_ratio: 1.0,
            atr_pct: 0.0,
            sma50_dist: 0.0,
            sma200_dist: 0.0,
            ema21_dist: 0.0,
            bb_width: 0.0,
            index_trend: 0.0,
            rs_rel: 0.0,
            mom_1m: 0.0,
            mom_3m: 0.0,
            mom_6m: 0.0,
            realized_vol: 0.0,
            vol_spike: 1.0,
            dist_52w_high: 0.0,
            dist_52w_low: 0.0,
            pct_above_200sma: 50.0,
            pct_at_52w_high: 5.0,
            adv_dec_ratio: 1.0,
            new_highs_lows: 0.0,
            index_rsi: 50.0,
            index_realized_vol: 0.0,
        }
    }

    #[test]
    fn zero_weights_give_sigmoid_of_bias() {
        let gate = LogisticGate::from_csv(&weight_file(0.0, |_| (0.0, 0.0, 1.0))).unwrap();
        let p = gate.predict(&neutral_features()).unwrap();
        assert!((p - 0.5).abs() < 1e-12);

        let gate = LogisticGate::from_csv(&weight_file(2.0, |_| (0.0, 0.0, 1.0))).unwrap();
        let p = gate.predict(&neutral_features()).unwrap();
        assert!((p - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn standardises_inputs() {
        // (rsi - 50) / 10 * 1.0 with rsi = 70 gives logit 2
        let gate = LogisticGate::from_csv(&weight_file(0.0, |name| {
            if name == "rsi" { (1.0, 50.0, 10.0) } else { (0.0, 0.0, 1.0) }
        }))
        .unwrap();
        let features = GateFeatures {
            rsi: 70.0,
            ..neutral_features()
        };
        let p = gate.predict(&features).unwrap();
        assert!((p - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn zero_scale_is_centred_only() {
        let gate = LogisticGate::from_csv(&weight_file(0.0, |name| {
            if name == "mom_1m" { (0.5, 0.0, 0.0) } else { (0.0, 0.0, 1.0) }
        }))
        .unwrap();
        let features = GateFeatures {
            mom_1m: 4.0,
            ..neutral_features()
        };
        let p = gate.predict(&features).unwrap();
        assert!((p - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn feature_names_follow_file_order() {
        let gate = LogisticGate::from_csv(&weight_file(0.0, |_| (0.1, 0.0, 1.0))).unwrap();
        assert_eq!(gate.feature_names(), FIELD_NAMES.map(String::from).to_vec());
        assert!(validate_gate_schema(&gate).is_ok());
    }

    #[test]
    fn partial_model_fails_schema_check() {
        let gate =
            LogisticGate::from_csv("feature,weight,mean,scale\nrsi,0.1,50,10\nmom_1m,0.2,0,5\n").unwrap();
        assert_eq!(gate.feature_names(), vec!["rsi", "mom_1m"]);
        assert!(matches!(
            validate_gate_schema(&gate),
            Err(RegimeTraderError::GateSchema { .. })
        ));
        assert!(matches!(
            gate.predict(&neutral_features()),
            Err(RegimeTraderError::Gate { .. })
        ));
    }

    #[test]
    fn rejects_bad_files() {
        assert!(LogisticGate::from_csv("feature,weight,mean,scale\n").is_err());
        assert!(LogisticGate::from_csv("feature,weight,mean,scale\nrsi,abc,0,1\n").is_err());
        assert!(LogisticGate::from_csv("feature,weight,mean,scale\nrsi,1,0,1\nrsi,2,0,1\n").is_err());
        assert!(
            LogisticGate::from_csv("feature,weight,mean,scale\nbias,1,0,1\nbias,2,0,1\nrsi,1,0,1\n")
                .is_err()
        );
        assert!(LogisticGate::from_csv("feature,weight,mean,scale\nrsi,1,0\n").is_err());
    }

    #[test]
    fn from_file_reads_weights() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", weight_file(-1.0, |_| (0.0, 0.0, 1.0))).unwrap();
        let gate = LogisticGate::from_file(file.path()).unwrap();
        let p = gate.predict(&neutral_features()).unwrap();
        assert!(p < 0.5);
    }

    #[test]
    fn from_file_missing_is_gate_error() {
        assert!(matches!(
            LogisticGate::from_file("/nonexistent/weights.csv"),
            Err(RegimeTraderError::Gate { .. })
        ));
    }
}

//! Settings type definitions.
//!
//! Field names are snake_case so that existing deployment files
//! (`{"id_service_url": .., "client_url": .., "solver_url": ..}`) load
//! unchanged. Every struct uses `#[serde(default)]`, so partial JSON is fine.

use proofread_core::constants::DEFAULT_CONTACT_THRESHOLDS;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofreadSettings {
    /// Address the solver binds for its single proofreading client.
    pub client_url: String,
    /// Address clients use to reach the solver (informational for the server,
    /// used by the simulator).
    pub solver_url: String,
    /// Endpoint of the ID service. `None` disables ID reservation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_service_url: Option<String>,
    /// Contact-area feature manager configuration.
    pub features: FeatureSettings,
    /// Classifier backend configuration.
    pub classifier: ClassifierSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for ProofreadSettings {
    fn default() -> Self {
        Self {
            client_url: "127.0.0.1:9001".to_string(),
            solver_url: "ws://127.0.0.1:9001".to_string(),
            id_service_url: None,
            features: FeatureSettings::default(),
            classifier: ClassifierSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ProofreadSettings {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.classifier.validate()
    }
}

/// Contact-area feature manager configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    /// Darkness thresholds, each in `[0, 1]`.
    pub thresholds: Vec<f64>,
    /// Use oriented rather than non-oriented probabilities.
    pub oriented: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_CONTACT_THRESHOLDS.to_vec(),
            oriented: false,
        }
    }
}

impl FeatureSettings {
    fn validate(&self) -> Result<()> {
        if self.thresholds.is_empty() {
            return Err(SettingsError::InvalidValue(
                "features.thresholds must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .thresholds
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0 || **t > 1.0)
        {
            return Err(SettingsError::InvalidValue(format!(
                "features.thresholds entry {bad} outside [0, 1]"
            )));
        }
        Ok(())
    }
}

/// Logistic-regression backend configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Gradient-descent step size.
    pub learning_rate: f64,
    /// Full passes over the training set.
    pub epochs: usize,
    /// L2 penalty on the weights.
    pub l2_penalty: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 500,
            l2_penalty: 1e-3,
        }
    }
}

impl ClassifierSettings {
    fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(SettingsError::InvalidValue(format!(
                "classifier.learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2_penalty.is_finite() && self.l2_penalty >= 0.0) {
            return Err(SettingsError::InvalidValue(format!(
                "classifier.l2_penalty must be non-negative, got {}",
                self.l2_penalty
            )));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level name (`trace`..`error`).
    pub level: String,
    /// Emit JSON lines.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ProofreadSettings::default();
        assert_eq!(settings.client_url, "127.0.0.1:9001");
        assert_eq!(settings.features.thresholds, vec![0.1, 0.5, 0.9]);
        assert!(!settings.features.oriented);
        assert_eq!(settings.classifier.epochs, 500);
        assert_eq!(settings.logging.level, "info");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: ProofreadSettings =
            serde_json::from_str(r#"{"features": {"oriented": true}}"#).unwrap();
        assert!(settings.features.oriented);
        assert_eq!(settings.features.thresholds.len(), 3);
        assert!(settings.id_service_url.is_none());
    }

    #[test]
    fn id_service_url_omitted_when_unset() {
        let json = serde_json::to_string(&ProofreadSettings::default()).unwrap();
        assert!(!json.contains("id_service_url"));
    }

    #[test]
    fn empty_thresholds_rejected() {
        let mut settings = ProofreadSettings::default();
        settings.features.thresholds.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let mut settings = ProofreadSettings::default();
        settings.features.thresholds = vec![0.2, 1.5];
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn non_positive_learning_rate_rejected() {
        let mut settings = ProofreadSettings::default();
        settings.classifier.learning_rate = 0.0;
        assert!(settings.validate().is_err());
    }
}

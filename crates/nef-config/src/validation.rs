// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every problem is collected and reported together rather than stopping at
//! the first one.

use crate::{ConfigError, ConfigResult, NefConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    OutOfRange { field: String, value: f64, reason: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                reason,
            } => write!(f, "{} = {} is out of range: {}", field, value, reason),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &NefConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Run every check and return the failures
pub fn collect_errors(config: &NefConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_simulation(config, &mut errors);
    validate_neurons(config, &mut errors);
    validate_decoder(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn out_of_range(field: &str, value: f64, reason: &str) -> ConfigValidationError {
    ConfigValidationError::OutOfRange {
        field: field.to_string(),
        value,
        reason: reason.to_string(),
    }
}

fn validate_simulation(config: &NefConfig, errors: &mut Vec<ConfigValidationError>) {
    let dt = config.simulation.dt;
    if !(dt.is_finite() && dt > 0.0) {
        errors.push(out_of_range("simulation.dt", dt, "must be finite and > 0"));
    }
}

fn validate_neurons(config: &NefConfig, errors: &mut Vec<ConfigValidationError>) {
    let n = &config.neurons;
    if n.model != "lif" && n.model != "lif_rate" {
        errors.push(ConfigValidationError::InvalidValue {
            field: "neurons.model".to_string(),
            reason: format!("unknown model '{}' (expected lif or lif_rate)", n.model),
        });
    }
    if !(n.tau_rc.is_finite() && n.tau_rc > 0.0) {
        errors.push(out_of_range("neurons.tau_rc", n.tau_rc, "must be > 0"));
    }
    if !(n.tau_ref.is_finite() && n.tau_ref >= 0.0) {
        errors.push(out_of_range("neurons.tau_ref", n.tau_ref, "must be >= 0"));
    }
    if !(n.max_rate_low > 0.0 && n.max_rate_low <= n.max_rate_high) {
        errors.push(out_of_range(
            "neurons.max_rate_low",
            n.max_rate_low,
            "must be > 0 and <= max_rate_high",
        ));
    }
    if n.tau_ref > 0.0 && n.max_rate_high >= 1.0 / n.tau_ref {
        errors.push(out_of_range(
            "neurons.max_rate_high",
            n.max_rate_high,
            "must be below 1 / tau_ref",
        ));
    }
    if !(-1.0..1.0).contains(&n.intercept_low) {
        errors.push(out_of_range(
            "neurons.intercept_low",
            n.intercept_low,
            "must lie in [-1, 1)",
        ));
    }
    if !(-1.0..1.0).contains(&n.intercept_high) {
        errors.push(out_of_range(
            "neurons.intercept_high",
            n.intercept_high,
            "must lie in [-1, 1)",
        ));
    }
    if n.intercept_low > n.intercept_high {
        errors.push(out_of_range(
            "neurons.intercept_low",
            n.intercept_low,
            "must be <= intercept_high",
        ));
    }
}

fn validate_decoder(config: &NefConfig, errors: &mut Vec<ConfigValidationError>) {
    let d = &config.decoder;
    if !(d.regularization.is_finite() && d.regularization >= 0.0) {
        errors.push(out_of_range(
            "decoder.regularization",
            d.regularization,
            "must be >= 0",
        ));
    }
    if d.max_eval_points == 0 || d.min_eval_points > d.max_eval_points {
        errors.push(ConfigValidationError::InvalidValue {
            field: "decoder.min_eval_points".to_string(),
            reason: format!(
                "need 0 < max_eval_points and min ({}) <= max ({})",
                d.min_eval_points, d.max_eval_points
            ),
        });
    }
    if d.eval_points_per_dimension == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "decoder.eval_points_per_dimension".to_string(),
            reason: "must be > 0".to_string(),
        });
    }
}

fn validate_logging(config: &NefConfig, errors: &mut Vec<ConfigValidationError>) {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    if !LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("unknown level '{}'", config.logging.level),
        });
    }
    if config.logging.retention_runs == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.retention_runs".to_string(),
            reason: "must keep at least the current run".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_passes() {
        assert!(collect_errors(&NefConfig::default()).is_empty());
    }

    #[test]
    fn test_all_problems_reported_together() {
        let mut config = NefConfig::default();
        config.simulation.dt = 0.0;
        config.neurons.tau_rc = -0.01;
        config.decoder.regularization = -1.0;
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 3);

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("simulation.dt"));
        assert!(message.contains("neurons.tau_rc"));
        assert!(message.contains("decoder.regularization"));
    }

    #[test]
    fn test_unreachable_max_rate_rejected() {
        let mut config = NefConfig::default();
        config.neurons.max_rate_high = 500.0; // 1 / 0.002
        let errors = collect_errors(&config);
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("neurons.max_rate_high")));
    }

    #[test]
    fn test_intercept_bounds() {
        let mut config = NefConfig::default();
        config.neurons.intercept_high = 1.0;
        assert_eq!(collect_errors(&config).len(), 1);

        let mut config = NefConfig::default();
        config.neurons.intercept_low = 0.5;
        config.neurons.intercept_high = 0.2;
        assert_eq!(collect_errors(&config).len(), 1);
    }

    #[test]
    fn test_empty_eval_point_range_rejected() {
        let mut config = NefConfig::default();
        config.decoder.min_eval_points = 3000;
        assert_eq!(collect_errors(&config).len(), 1);
    }

    #[test]
    fn test_unknown_model_and_level() {
        let mut config = NefConfig::default();
        config.neurons.model = "izhikevich".to_string();
        config.logging.level = "loud".to_string();
        assert_eq!(collect_errors(&config).len(), 2);
    }

    #[test]
    fn test_zero_retained_runs_rejected() {
        let mut config = NefConfig::default();
        config.logging.retention_runs = 0;
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("logging.retention_runs"));
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::validation::validate_config;
use crate::{ConfigError, ConfigResult, NefConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "nef_configuration.toml";

/// Find the NEF configuration file
///
/// Search order:
/// 1. `NEF_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEF_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NEF_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet NEF_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file, apply overrides, then validate
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NefConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NefConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEF_DT` -> `simulation.dt`
/// - `NEF_SEED` -> `simulation.seed`
/// - `NEF_PARALLEL` -> `runtime.parallel`
/// - `NEF_NUM_THREADS` -> `runtime.num_threads`
/// - `NEF_LOG_LEVEL` -> `logging.level`
/// - `NEF_REGULARIZATION` -> `decoder.regularization`
///
/// Unparseable values are ignored.
pub fn apply_environment_overrides(config: &mut NefConfig) {
    if let Some(dt) = env::var("NEF_DT").ok().and_then(|v| v.parse().ok()) {
        config.simulation.dt = dt;
    }
    if let Some(seed) = env::var("NEF_SEED").ok().and_then(|v| v.parse().ok()) {
        config.simulation.seed = Some(seed);
    }
    if let Ok(value) = env::var("NEF_PARALLEL") {
        config.runtime.parallel = parse_bool(&value);
    }
    if let Some(threads) = env::var("NEF_NUM_THREADS").ok().and_then(|v| v.parse().ok()) {
        config.runtime.num_threads = threads;
    }
    if let Ok(value) = env::var("NEF_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Some(reg) = env::var("NEF_REGULARIZATION")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.decoder.regularization = reg;
    }
}

/// Apply CLI argument overrides to configuration
///
/// Recognized keys: `dt`, `seed`, `parallel`, `num_threads`, `log_level`,
/// `regularization`.
pub fn apply_cli_overrides(config: &mut NefConfig, cli_args: &HashMap<String, String>) {
    if let Some(dt) = cli_args.get("dt").and_then(|v| v.parse().ok()) {
        config.simulation.dt = dt;
    }
    if let Some(seed) = cli_args.get("seed").and_then(|v| v.parse().ok()) {
        config.simulation.seed = Some(seed);
    }
    if let Some(value) = cli_args.get("parallel") {
        config.runtime.parallel = parse_bool(value);
    }
    if let Some(threads) = cli_args.get("num_threads").and_then(|v| v.parse().ok()) {
        config.runtime.num_threads = threads;
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(reg) = cli_args.get("regularization").and_then(|v| v.parse().ok()) {
        config.decoder.regularization = reg;
    }
}

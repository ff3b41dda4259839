// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration-driven entry point: load `nef_configuration.toml`, build
//! networks with the configured defaults and share one decoder cache across
//! builds when `decoder.cache` is enabled.

use std::collections::HashMap;
use std::path::Path;

use nef_config::{ConfigError, NefConfig};
use nef_npu_engine::{DecoderCache, EngineError, ModelBuilder, Network, Simulator};
use tracing::debug;

/// Errors from any layer the session drives
#[derive(Debug, thiserror::Error)]
pub enum NefError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[cfg(feature = "observability")]
    #[error("Logging error: {0}")]
    Observability(#[from] nef_observability::ObservabilityError),
}

pub type Result<T> = std::result::Result<T, NefError>;

/// Loaded configuration plus the state shared between builds
#[derive(Debug)]
pub struct Session {
    config: NefConfig,
    cache: Option<DecoderCache>,
}

impl Session {
    pub fn new(config: NefConfig) -> Self {
        let cache = config.decoder.cache.then(DecoderCache::new);
        Self { config, cache }
    }

    /// Load, override and validate the configuration file
    ///
    /// `path = None` searches `NEF_CONFIG_PATH`, the working directory and
    /// its parents.
    pub fn load(path: Option<&Path>, cli_args: Option<&HashMap<String, String>>) -> Result<Self> {
        let config = nef_config::load_config(path, cli_args)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &NefConfig {
        &self.config
    }

    pub fn decoder_cache(&self) -> Option<&DecoderCache> {
        self.cache.as_ref()
    }

    /// Empty builder carrying the configured dt, seed and defaults
    pub fn builder(&self) -> Result<ModelBuilder> {
        Ok(ModelBuilder::from_config(&self.config)?)
    }

    pub fn build(&self, builder: ModelBuilder) -> Result<Network> {
        let network = match &self.cache {
            Some(cache) => {
                let network = builder.build_with_cache(cache)?;
                debug!(
                    "[NEF-BUILD] Decoder cache: {} entries, {} hits, {} misses",
                    cache.len(),
                    cache.hits(),
                    cache.misses()
                );
                network
            }
            None => builder.build()?,
        };
        Ok(network)
    }

    pub fn simulator(&self, builder: ModelBuilder) -> Result<Simulator> {
        Ok(Simulator::new(self.build(builder)?)?)
    }

    /// File logging settings from `[logging]`, if a `log_dir` is configured
    #[cfg(feature = "observability")]
    pub fn file_logging(&self) -> Option<nef_observability::FileLogging> {
        let logging = &self.config.logging;
        logging.log_dir.as_deref().map(|dir| {
            nef_observability::FileLogging::new(dir)
                .with_retention(logging.retention_days, logging.retention_runs)
        })
    }

    /// Install the global subscriber at `logging.level`, writing files under
    /// `logging.log_dir` when one is configured
    #[cfg(feature = "observability")]
    pub fn init_logging(
        &self,
        debug_flags: &nef_observability::CrateDebugFlags,
    ) -> Result<nef_observability::LoggingGuard> {
        Ok(nef_observability::init_logging(
            &self.config.logging.level,
            debug_flags,
            self.file_logging().as_ref(),
        )?)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(NefConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_follows_config() {
        assert!(Session::default().decoder_cache().is_none());

        let mut config = NefConfig::default();
        config.decoder.cache = true;
        assert!(Session::new(config).decoder_cache().is_some());
    }

    #[cfg(feature = "observability")]
    #[test]
    fn test_file_logging_follows_config() {
        assert!(Session::default().file_logging().is_none());

        let mut config = NefConfig::default();
        config.logging.log_dir = Some("logs".to_string());
        config.logging.retention_days = 7;
        config.logging.retention_runs = 3;
        let files = Session::new(config).file_logging().unwrap();
        assert_eq!(files.dir, std::path::PathBuf::from("logs"));
        assert_eq!((files.retention_days, files.retention_runs), (7, 3));
    }

    #[test]
    fn test_builder_uses_configured_dt() {
        let mut config = NefConfig::default();
        config.simulation.dt = 0.0005;
        let builder = Session::new(config).builder().unwrap();
        assert_eq!(builder.config().dt, 0.0005);
    }
}

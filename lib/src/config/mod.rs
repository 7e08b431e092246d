// lib/src/config/mod.rs
//! Layered configuration: built-in defaults, then an optional file, then the
//! environment.

pub mod config_defaults;
pub mod config_structs;

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use tracing::{debug, warn};

pub use config_defaults::*;
pub use config_structs::*;

impl AppConfig {
    /// Loads `path` if given, otherwise `medscript.{toml,yaml,json}` from the
    /// working directory when present. `MEDSCRIPT__SECTION__KEY` variables win
    /// over both, and the bare `PORT` and `JWT_SECRET` variables win over those.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false)),
        };
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .context("Failed to assemble configuration sources")?;

        let mut app: AppConfig = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        app.apply_overrides(|name| std::env::var(name).ok())?;

        if app.auth.jwt_secret == default_jwt_secret() {
            warn!("Using the built-in development JWT secret; set JWT_SECRET in production");
        }
        Ok(app)
    }

    /// Applies the deployment-level `PORT` and `JWT_SECRET` variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }
        if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            self.auth.jwt_secret = secret;
        }
        Ok(())
    }
}

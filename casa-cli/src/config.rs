use anyhow::Result;
use clap::ArgMatches;
use clap::parser::ValueSource;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "./casa.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CasaConfig {
    /// Build configuration
    pub build: BuildConfig,
    /// Site and style configuration (from casa-core)
    #[serde(flatten)]
    pub site: casa_core::config::Config,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Content directory containing markdown files
    pub source: String,
    /// Output directory for generated site
    pub output: String,
    /// Theme directory
    pub theme: String,
    /// Extract and render documents on the rayon pool
    pub parallel: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: "./content".to_string(),
            output: "./out".to_string(),
            theme: "./theme".to_string(),
            parallel: true,
        }
    }
}

impl CasaConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (CASA_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = args
            .try_get_one::<String>("config")
            .ok()
            .flatten()
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        builder = builder.add_source(ConfigBuilder::try_from(&Self::default())?);

        // 2. Add configuration file if it exists
        if Path::new(&config_file).exists() {
            builder = builder.add_source(File::with_name(&config_file));
        }

        // 3. Add environment variables with CASA_ prefix
        builder = builder.add_source(
            Environment::with_prefix("CASA")
                .prefix_separator("_")
                .separator("__") // Use double underscore for nested keys
                .try_parsing(true),
        );

        // 4. Override with CLI arguments actually given on the command line
        for key in ["source", "output", "theme"] {
            if let Some(value) = from_command_line(args, key) {
                builder = builder.set_override(format!("build.{key}"), value)?;
            }
        }
        if args.try_get_one::<bool>("sequential").ok().flatten() == Some(&true) {
            builder = builder.set_override("build.parallel", false)?;
        }

        // Build and deserialize
        let casa_config: CasaConfig = builder.build()?.try_deserialize()?;
        casa_config.site.style.validate()?;

        Ok(casa_config)
    }
}

/// Only defined for this command, and typed by the user rather than
/// filled in from a clap default.
fn from_command_line(args: &ArgMatches, id: &str) -> Option<String> {
    let value = args.try_get_one::<String>(id).ok().flatten()?;
    match args.value_source(id) {
        Some(ValueSource::CommandLine) => Some(value.clone()),
        _ => None,
    }
}

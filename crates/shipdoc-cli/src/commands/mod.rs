//! CLI subcommands.

pub mod config;
pub mod extract;
pub mod parse;
pub mod rules;

use std::path::{Path, PathBuf};

use tracing::debug;

use shipdoc_core::extract::rules::{default_rule_table, load_rule_table, RuleTableDef};
use shipdoc_core::models::config::ShipdocConfig;
use shipdoc_core::RuleEngine;

/// Load the configuration from `--config`, else the default location, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ShipdocConfig> {
    let config = match config_path {
        Some(path) => ShipdocConfig::from_file(Path::new(path))?,
        None => ShipdocConfig::load_or_default(&config::default_config_path())?,
    };
    Ok(config)
}

/// Rule table from `--rules`, else the configured file, else the built-in table.
pub fn load_rules(rules: Option<&Path>, config: &ShipdocConfig) -> anyhow::Result<RuleTableDef> {
    let path: Option<PathBuf> = rules
        .map(Path::to_path_buf)
        .or_else(|| config.extraction.rules_file.clone());

    let table = match path {
        Some(path) => {
            debug!("Loading rule table from {}", path.display());
            load_rule_table(&path)?
        }
        None => default_rule_table()?,
    };
    Ok(table)
}

/// Compile the rule table selected by `rules` and the configuration.
pub fn load_engine(rules: Option<&Path>, config: &ShipdocConfig) -> anyhow::Result<RuleEngine> {
    let table = load_rules(rules, config)?;
    Ok(RuleEngine::new(&table)?)
}

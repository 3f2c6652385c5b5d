//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use quotes_core::Config;

use crate::output::{Output, OutputFormat};

const KEYS: &str = "data_dir, sync_url, sync_interval_secs, sync_timeout_secs, fetch_limit, \
                    push_limit, push_enabled, server_category, storage_quota_bytes, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:            {}", config.data_dir.display());
            println!("  sync_url:            {}", config.sync_url);
            println!("  sync_interval_secs:  {}", config.sync_interval_secs);
            println!("  sync_timeout_secs:   {}", config.sync_timeout_secs);
            println!("  fetch_limit:         {}", config.fetch_limit);
            println!("  push_limit:          {}", config.push_limit);
            println!("  push_enabled:        {}", config.push_enabled);
            println!("  server_category:     {}", config.server_category);
            println!("  storage_quota_bytes: {}", config.storage_quota_bytes);
            println!(
                "  log_file:            {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply one `key = value` change
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => config.data_dir = value.into(),
        "sync_url" => {
            if value.is_empty() {
                bail!("sync_url cannot be empty");
            }
            config.sync_url = value.to_string();
        }
        "sync_interval_secs" => {
            config.sync_interval_secs = parse_positive(key, value)?;
        }
        "sync_timeout_secs" => {
            config.sync_timeout_secs = parse_positive(key, value)?;
        }
        "fetch_limit" => {
            config.fetch_limit = value
                .parse()
                .with_context(|| format!("Invalid value for {}. Use a number.", key))?;
        }
        "push_limit" => {
            config.push_limit = value
                .parse()
                .with_context(|| format!("Invalid value for {}. Use a number.", key))?;
        }
        "push_enabled" => {
            config.push_enabled = value
                .parse()
                .context("Invalid value for push_enabled. Use 'true' or 'false'.")?;
        }
        "server_category" => {
            let value = value.trim();
            if value.is_empty() {
                bail!("server_category cannot be empty");
            }
            config.server_category = value.to_string();
        }
        "storage_quota_bytes" => {
            config.storage_quota_bytes = value
                .parse()
                .context("Invalid value for storage_quota_bytes. Use a number (0 = unlimited).")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                KEYS
            );
        }
    }
    Ok(())
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("Invalid value for {}. Use a whole number of seconds above 0.", key),
    }
}

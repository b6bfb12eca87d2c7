//! Configuration management commands.

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, Backend, CliConfig, CONFIG_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Get { key } => get_config(&key, ctx),
        ConfigCommand::Set { key, value } => set_config(&key, &value, ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");

    ctx.output.info("[store]");
    ctx.output.kv("backend", ctx.config.store.backend.as_str());
    match ctx.config.store.backend {
        Backend::Memory => ctx.output.kv("snapshot", &ctx.config.store.snapshot),
        Backend::Rest => ctx.output.kv("base_url", &ctx.config.store.base_url),
    }
    ctx.output.kv("timeout_ms", &ctx.config.store.timeout_ms.to_string());

    ctx.output.info("[checkout]");
    ctx.output.kv(
        "max_pending_orders",
        &ctx.config.checkout.max_pending_orders.to_string(),
    );
    ctx.output.kv("currency", &ctx.config.checkout.currency);

    ctx.output.info("[log]");
    ctx.output.kv("format", &ctx.config.log.format);
    if !ctx.config.log.filter.is_empty() {
        ctx.output.kv("filter", &ctx.config.log.filter);
    }

    Ok(())
}

fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = get_config_value(&ctx.config, key)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

fn set_config(key: &str, value: &str, ctx: &Context) -> Result<()> {
    let config_path = find_config_file(&ctx.cwd)?;
    let mut config = CliConfig::load(&config_path)?;

    set_config_value(&mut config, key, value)?;
    config.save(&config_path)?;

    ctx.output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check_config(&ctx.config, |path| ctx.resolve_path(path).exists());

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Errors and warnings for a config. `exists` reports whether a
/// configured file is present.
fn check_config(config: &CliConfig, exists: impl Fn(&str) -> bool) -> (Vec<String>, Vec<String>) {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if config.checkout.currency().is_err() {
        errors.push(format!("checkout.currency '{}' is not supported", config.checkout.currency));
    }

    if config.checkout.max_pending_orders == 0 {
        warnings.push("checkout.max_pending_orders is 0; every order will be refused".to_string());
    }

    if config.store.timeout_ms == 0 {
        errors.push("store.timeout_ms must be greater than 0".to_string());
    }

    match config.store.backend {
        Backend::Memory => {
            if !exists(&config.store.snapshot) {
                errors.push(format!("store.snapshot '{}' does not exist", config.store.snapshot));
            }
        }
        Backend::Rest => {
            let url = &config.store.base_url;
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(format!("store.base_url '{}' must be an http(s) URL", url));
            }
        }
    }

    if config.log.format.parse::<checkout_observability::LogFormat>().is_err() {
        errors.push(format!("log.format '{}' must be human or json", config.log.format));
    }

    (errors, warnings)
}

fn get_config_value(config: &CliConfig, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["store", "backend"] => Ok(format!("\"{}\"", config.store.backend.as_str())),
        ["store", "base_url"] => Ok(format!("\"{}\"", config.store.base_url)),
        ["store", "snapshot"] => Ok(format!("\"{}\"", config.store.snapshot)),
        ["store", "timeout_ms"] => Ok(config.store.timeout_ms.to_string()),
        ["checkout", "max_pending_orders"] => Ok(config.checkout.max_pending_orders.to_string()),
        ["checkout", "currency"] => Ok(format!("\"{}\"", config.checkout.currency)),
        ["log", "format"] => Ok(format!("\"{}\"", config.log.format)),
        ["log", "filter"] => Ok(format!("\"{}\"", config.log.filter)),
        _ => bail!("Unknown config key: {}", key),
    }
}

fn set_config_value(config: &mut CliConfig, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["store", "backend"] => config.store.backend = value.parse()?,
        ["store", "base_url"] => config.store.base_url = value.to_string(),
        ["store", "snapshot"] => config.store.snapshot = value.to_string(),
        ["store", "timeout_ms"] => config.store.timeout_ms = value.parse()?,
        ["checkout", "max_pending_orders"] => config.checkout.max_pending_orders = value.parse()?,
        ["checkout", "currency"] => config.checkout.currency = value.to_uppercase(),
        ["log", "format"] => config.log.format = value.to_string(),
        ["log", "filter"] => config.log.filter = value.to_string(),
        _ => bail!("Unknown or read-only config key: {}", key),
    }

    Ok(())
}

fn find_config_file(cwd: &Path) -> Result<String> {
    for name in &CONFIG_NAMES {
        let path = cwd.join(name);
        if path.exists() {
            return Ok(path.to_string_lossy().to_string());
        }
    }
    bail!("No config file found. Run `checkout config init` to create one.")
}

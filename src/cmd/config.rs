//! Configuration view and validation commands — `enrollkit config`.

use anyhow::{Context as _, Result};
use serde::Serialize;

use enrollkit::config::EnrollToml;

use super::super::ConfigCommands;
use super::{Completion, Context};

#[derive(Serialize)]
struct ConfigView<'a> {
    config_file: String,
    config_file_exists: bool,
    secrets_dir: String,
    settings: &'a EnrollToml,
    warnings: Vec<String>,
}

pub fn cmd_config(ctx: &Context, command: Option<ConfigCommands>) -> Result<Completion> {
    match command {
        None | Some(ConfigCommands::Show) => show(ctx),
        Some(ConfigCommands::Validate) => validate(ctx),
        Some(ConfigCommands::Init) => init(ctx),
    }
}

fn show(ctx: &Context) -> Result<Completion> {
    let warnings = ctx.config.validate();

    if ctx.json {
        ctx.print_result(&ConfigView {
            config_file: ctx.config_path.display().to_string(),
            config_file_exists: ctx.config_path.exists(),
            secrets_dir: ctx.secrets.root().display().to_string(),
            settings: &ctx.config,
            warnings,
        })?;
        return Ok(Completion::Complete);
    }

    println!();
    println!("enrollkit configuration");
    println!("=======================");
    println!();
    if ctx.config_path.exists() {
        println!("Config file: {}", ctx.config_path.display());
    } else {
        println!(
            "No config file at {} (using defaults)",
            ctx.config_path.display()
        );
    }
    println!("Secrets dir: {}", ctx.secrets.root().display());
    println!();

    let fetch = &ctx.config.fetch;
    println!("Effective values (with env overrides):");
    println!("[fetch]");
    println!("  concurrency = {}", fetch.concurrency);
    println!("  max_page_size = {}", fetch.max_page_size);
    println!("  discovery_page_size = {}", fetch.discovery_page_size);
    println!("  request_timeout_secs = {}", fetch.request_timeout_secs);
    println!("  overall_timeout_secs = {}", fetch.overall_timeout_secs);
    println!("  fail_fast = {}", fetch.fail_fast);
    println!("  max_pages = {}", fetch.max_pages);
    println!();
    println!("[notify]");
    println!("  on_error = {}", ctx.config.notify.on_error);
    println!();

    print_warnings(&warnings);
    Ok(Completion::Complete)
}

fn validate(ctx: &Context) -> Result<Completion> {
    let warnings = ctx.config.validate();

    if ctx.json {
        ctx.print_result(&serde_json::json!({
            "valid": warnings.is_empty(),
            "warnings": warnings,
        }))?;
        return Ok(Completion::Complete);
    }

    if warnings.is_empty() {
        println!("Configuration is valid.");
    } else {
        print_warnings(&warnings);
    }
    Ok(Completion::Complete)
}

fn init(ctx: &Context) -> Result<Completion> {
    if ctx.config_path.exists() {
        anyhow::bail!(
            "Config file already exists at {}",
            ctx.config_path.display()
        );
    }
    EnrollToml::default()
        .save(&ctx.config_path)
        .context("Failed to write default configuration")?;

    if ctx.json {
        ctx.print_result(&serde_json::json!({
            "created": ctx.config_path.display().to_string(),
        }))?;
    } else {
        println!("Created {}", ctx.config_path.display());
    }
    Ok(Completion::Complete)
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("Warnings:");
    for warning in warnings {
        println!("  - {warning}");
    }
    println!();
}

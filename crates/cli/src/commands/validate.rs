//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::FunnelConfig;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    title: Option<String>,
    backlog_warning: usize,
    sink_count: usize,
    recipient_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    title: config.title.clone(),
                    backlog_warning: config.backlog_warning,
                    sink_count: sink_count(&config),
                    recipient_count: config.notify.as_ref().map_or(0, |n| n.recipients.len()),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn sink_count(config: &FunnelConfig) -> usize {
    usize::from(config.trace) + usize::from(config.log.is_some()) + usize::from(config.notify.is_some())
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &FunnelConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if sink_count(config) == 0 {
        warnings.push("No sinks configured - errors only reach in-process listeners".to_string());
    }

    if let Some(notify) = &config.notify {
        if notify.mail.is_none() {
            warnings.push(
                "notify.mail is not set - mail settings will be loaded from the `mail` namespace"
                    .to_string(),
            );
        }
        if config.title.is_none() {
            warnings.push("title is not set - email subjects will be the error message".to_string());
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            if let Some(ref title) = summary.title {
                println!("  Title: {}", title);
            }
            println!("  Backlog warning: {}", summary.backlog_warning);
            println!("  Sinks: {}", summary.sink_count);
            println!("  Recipients: {}", summary.recipient_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

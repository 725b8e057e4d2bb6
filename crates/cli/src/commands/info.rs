//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{FunnelConfig, MailConfig};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    backlog_warning: usize,
    sinks: Vec<SinkInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mail: Option<MailInfo>,
}

#[derive(Serialize)]
struct SinkInfo {
    kind: &'static str,
    target: String,
}

#[derive(Serialize)]
struct MailInfo {
    source: &'static str,
    host: String,
    port: u16,
    secure: bool,
    user: String,
    has_password: bool,
}

impl MailInfo {
    fn new(source: &'static str, config: &MailConfig) -> Self {
        Self {
            source,
            host: config.host.clone(),
            port: config.port,
            secure: config.secure,
            user: config.auth.user.clone(),
            has_password: !config.auth.pass.is_empty(),
        }
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let mail = if args.mail {
        resolve_mail(&config)?
    } else {
        None
    };
    let info = build_info(&config, mail);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_info(&info);
    }

    Ok(())
}

fn resolve_mail(config: &FunnelConfig) -> Result<Option<MailInfo>> {
    let Some(notify) = &config.notify else {
        return Ok(None);
    };

    match &notify.mail {
        Some(mail) => Ok(Some(MailInfo::new("notify.mail", mail))),
        None => {
            let mail = config_loader::ConfigLoader::load_mail()
                .context("Failed to resolve the `mail` namespace")?;
            Ok(Some(MailInfo::new("mail namespace", &mail)))
        }
    }
}

fn build_info(config: &FunnelConfig, mail: Option<MailInfo>) -> ConfigInfo {
    let mut sinks = Vec::new();
    if config.trace {
        sinks.push(SinkInfo {
            kind: "trace",
            target: "tracing".to_string(),
        });
    }
    if let Some(log) = &config.log {
        sinks.push(SinkInfo {
            kind: "file",
            target: log.path.display().to_string(),
        });
    }
    if let Some(notify) = &config.notify {
        sinks.push(SinkInfo {
            kind: "email",
            target: notify.recipients.as_slice().join(", "),
        });
    }

    ConfigInfo {
        version: format!("{:?}", config.version),
        title: config.title.clone(),
        backlog_warning: config.backlog_warning,
        sinks,
        mail,
    }
}

fn print_info(info: &ConfigInfo) {
    println!("\n=== Funnel Configuration ===\n");
    println!("Version: {}", info.version);
    println!(
        "Title: {}",
        info.title.as_deref().unwrap_or("(error message)")
    );
    println!("Backlog warning: {}", info.backlog_warning);

    println!("\nSinks ({}):", info.sinks.len());
    for sink in &info.sinks {
        println!("  - {:<6} {}", sink.kind, sink.target);
    }

    if let Some(ref mail) = info.mail {
        println!("\nMail ({}):", mail.source);
        println!("  Relay: {}:{}", mail.host, mail.port);
        println!("  TLS: {}", if mail.secure { "implicit" } else { "STARTTLS" });
        println!("  User: {}", mail.user);
        println!("  Password: {}", if mail.has_password { "set" } else { "none" });
    }

    println!();
}

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;

use enrollkit::config::{EnrollToml, default_config_path};
use enrollkit::notify::SlackNotifier;
use enrollkit::output::Envelope;
use enrollkit::secrets::SecretsDir;

mod cmd;

use cmd::{Completion, Context};

#[derive(Parser)]
#[command(name = "enrollkit")]
#[command(version, about = "Enrollment glue for ActiveCampaign listings, lookups and tagging")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print one JSON line ({"result": ...} or {"error": ...}) instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding activecampaign.yaml and slack.yaml
    #[arg(long, global = true)]
    pub secrets_dir: Option<PathBuf>,

    /// Path to enrollkit.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Forward failures to the Slack webhook configured in slack.yaml
    #[arg(long, global = true)]
    pub notify: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every contact
    Contacts,
    /// List every tag
    Tags {
        /// Only show tags whose name contains this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
    },
    /// List every automation
    Automations,
    /// List every contact enrolled in an automation
    AutomationContacts {
        /// Automation id
        automation_id: String,
    },
    /// Show one contact and the tags applied to it
    Contact {
        email: String,
    },
    /// Apply a tag (by name) to a contact
    TagContact {
        email: String,
        tag: String,
        /// Show what would change without changing it
        #[arg(short, long)]
        dry_run: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Contacts => "contacts",
            Commands::Tags { .. } => "tags",
            Commands::Automations => "automations",
            Commands::AutomationContacts { .. } => "automation-contacts",
            Commands::Contact { .. } => "contact",
            Commands::TagContact { .. } => "tag-contact",
            Commands::Config { .. } => "config",
        }
    }
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default enrollkit.toml
    Init,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    enrollkit::logging::init(cli.verbose);

    let ctx = match build_context(&cli) {
        Ok(ctx) => ctx,
        Err(e) => return fail(&cli, None, &e).await,
    };

    match dispatch(&cli, &ctx).await {
        Ok(Completion::Complete) => ExitCode::SUCCESS,
        Ok(Completion::Partial { message }) => {
            notify(&cli, &ctx, &message).await;
            ExitCode::from(2)
        }
        Err(e) => fail(&cli, Some(&ctx), &e).await,
    }
}

fn build_context(cli: &Cli) -> Result<Context> {
    let (config_path, mut config) = match &cli.config {
        Some(path) if path.exists() => (path.clone(), EnrollToml::load(path)?),
        Some(path) if is_config_init(&cli.command) => (path.clone(), EnrollToml::default()),
        Some(path) => anyhow::bail!("Config file not found: {}", path.display()),
        None => {
            let path = default_config_path();
            let config = EnrollToml::load_or_default(&path)?;
            (path, config)
        }
    };
    config.apply_env();

    let secrets = SecretsDir::resolve(cli.secrets_dir.as_deref(), config.paths.secrets_dir.as_deref());

    Ok(Context {
        json: cli.json,
        config,
        config_path,
        secrets,
    })
}

fn is_config_init(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Config {
            command: Some(ConfigCommands::Init)
        }
    )
}

async fn dispatch(cli: &Cli, ctx: &Context) -> Result<Completion> {
    match &cli.command {
        Commands::Contacts => cmd::cmd_contacts(ctx).await,
        Commands::Tags { filter } => cmd::cmd_tags(ctx, filter.as_deref()).await,
        Commands::Automations => cmd::cmd_automations(ctx).await,
        Commands::AutomationContacts { automation_id } => {
            cmd::cmd_automation_contacts(ctx, automation_id).await
        }
        Commands::Contact { email } => cmd::cmd_contact(ctx, email).await,
        Commands::TagContact {
            email,
            tag,
            dry_run,
        } => cmd::cmd_tag_contact(ctx, email, tag, *dry_run).await,
        Commands::Config { command } => cmd::cmd_config(ctx, command.clone()),
    }
}

async fn fail(cli: &Cli, ctx: Option<&Context>, err: &anyhow::Error) -> ExitCode {
    let message = format!("{err:#}");
    tracing::debug!(command = cli.command.name(), error = %message, "command failed");

    if cli.json {
        println!("{}", Envelope::err(&message).to_line());
    } else {
        eprintln!("{} {}", style("error:").red().bold(), message);
    }

    if let Some(ctx) = ctx {
        notify(cli, ctx, &message).await;
    }
    ExitCode::FAILURE
}

async fn notify(cli: &Cli, ctx: &Context, message: &str) {
    if !(cli.notify || ctx.config.notify.on_error) {
        return;
    }
    let notifier = ctx
        .secrets
        .slack()
        .context("Slack forwarding is enabled but slack.yaml could not be loaded")
        .and_then(|secrets| Ok(SlackNotifier::new(&secrets)?));
    match notifier {
        Ok(notifier) => notifier.forward_error(cli.command.name(), message).await,
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "error not forwarded to Slack"),
    }
}

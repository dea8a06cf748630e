//! RuBAC command line
//!
//! Compiles a policy directory and answers single decisions against it

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rubac::{DecisionInput, PolicyService, RequestAttributes, RuleFold, ServiceConfig, UserAttributes};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rubac")]
#[command(about = "Rule-based access control policy tool")]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Policy directory (overrides the config file)
    #[arg(short = 'p', long, env = "RULES_FOLDER", global = true)]
    policies: Option<PathBuf>,

    /// Rule fold (strict, loose)
    #[arg(long, global = true)]
    rule_fold: Option<String>,

    /// Keep the last document when policy ids repeat
    #[arg(long, global = true)]
    allow_duplicate_ids: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile every policy document and list the result
    Check,

    /// Evaluate one request against a policy
    Decide {
        /// Policy id (the document's WorkflowID)
        #[arg(long)]
        policy_id: String,

        /// Caller role
        #[arg(long)]
        role: String,

        /// Caller IP address
        #[arg(long)]
        ip: String,

        /// Request path
        #[arg(long)]
        path: String,
    },
}

/// Parse rule fold from CLI string
fn parse_rule_fold(s: &str) -> Result<RuleFold, String> {
    match s.to_lowercase().as_str() {
        "strict" => Ok(RuleFold::Strict),
        "loose" => Ok(RuleFold::Loose),
        _ => Err(format!(
            "Invalid rule fold '{}'. Valid options: strict, loose",
            s
        )),
    }
}

fn resolve_config(args: &Args) -> anyhow::Result<ServiceConfig> {
    let mut config = match &args.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    if let Some(dir) = &args.policies {
        config.policy_dir = dir.clone();
    }
    if let Some(fold) = &args.rule_fold {
        config.rule_fold = parse_rule_fold(fold).map_err(anyhow::Error::msg)?;
    }
    if args.allow_duplicate_ids {
        config.allow_duplicate_ids = true;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    info!("Policy directory: {:?}", config.policy_dir);

    let service = PolicyService::load(config).context("loading policies")?;

    match args.command {
        Command::Check => {
            let registry = service.snapshot();
            if registry.is_empty() {
                bail!("no policy documents found");
            }
            for workflow in registry.iter() {
                println!(
                    "{}\t{}\t{}\t{} params\t{} rules",
                    workflow.id(),
                    workflow.path_pattern().as_str(),
                    workflow.name(),
                    workflow.params().len(),
                    workflow.rules().len()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Decide {
            policy_id,
            role,
            ip,
            path,
        } => {
            let input = DecisionInput::new(UserAttributes::new(role), RequestAttributes::new(ip, path));
            let allowed = service
                .check(&input, &policy_id)
                .with_context(|| format!("evaluating policy {}", policy_id))?;
            if allowed {
                println!("allow");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("deny");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use signer_core::{CONFIG_PATH_ENV, SignerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "signer", version, about = "App package signing service")]
struct Cli {
    /// Configuration file (defaults to signer.yaml)
    #[arg(long, global = true, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP signing service.
    Serve,

    /// Bearer token management.
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Print the hash manifest of an app directory as JSON.
    Manifest {
        /// App directory
        dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a token granting the given claims, e.g. "sign:my-app" or "sign:*".
    Create {
        /// Who the token is issued to
        subject: String,

        /// Claims of the form <verb>:<namespace>
        #[arg(required = true)]
        claims: Vec<String>,

        /// Validity in seconds (defaults to token.default_validity_secs)
        #[arg(long)]
        valid: Option<u64>,

        /// Issuer (defaults to token.issuer)
        #[arg(long)]
        issuer: Option<String>,
    },
}

fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<SignerConfig> {
    let path = SignerConfig::resolve_path(explicit);
    SignerConfig::from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve => {
            let config = load_config(cli.config)?;
            commands::serve::run(config).await?;
        }

        Command::Token {
            cmd:
                TokenCommand::Create {
                    subject,
                    claims,
                    valid,
                    issuer,
                },
        } => {
            let config = load_config(cli.config)?;
            let token =
                commands::token::create(&config.token, &subject, &claims, valid, issuer.as_deref())?;
            println!("{}", token);
        }

        Command::Manifest { dir } => {
            println!("{}", commands::manifest::render(&dir)?);
        }
    }

    Ok(())
}

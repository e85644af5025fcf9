//! ctfkit - CTF challenge manager
//!
//! Usage:
//!   ctfkit add <repo>          # Register a challenge (git URL or directory)
//!   ctfkit install [challenge] # Create challenges on the platform
//!   ctfkit verify [challenge]  # Compare local definitions with the platform
//!   ctfkit push [challenge]    # Publish challenge changes upstream

mod handlers;
mod reporter;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ctfkit_core::challenge::IgnoreSet;
use ctfkit_core::commands::{
    AddCommand, AddOptions, DeployCommand, DeployOptions, FormatCommand, FormatOptions,
    HealthcheckCommand, HealthcheckOptions, InstallCommand, InstallOptions, MirrorCommand,
    MirrorOptions, ProjectContext, PullCommand, PullOptions, PushCommand, PushOptions,
    RestoreCommand, RestoreOptions, SyncCommand, SyncOptions, VerifyCommand, VerifyOptions,
};
use ctfkit_core::git::PullStrategy;
use ctfkit_core::selector::ChallengeSelector;

use crate::reporter::ConsoleReporter;

#[derive(Parser)]
#[command(name = "ctfkit")]
#[command(about = "Manage CTF challenges across git and the challenge platform", long_about = None)]
struct Cli {
    /// Suppress progress bars and summary banners
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Project root (defaults to the nearest directory with .ctf/config.toml)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a challenge from a git repository or a local directory
    Add(AddArgs),

    /// Create challenges on the platform
    Install {
        /// Challenge key, definition path, or `.` (default: all)
        challenge: Option<String>,
        /// Sync challenges that are already installed
        #[arg(long)]
        force: bool,
        /// Install as hidden
        #[arg(long)]
        hidden: bool,
        #[command(flatten)]
        ignore: IgnoreArgs,
    },

    /// Update installed challenges from their local definitions
    Sync {
        challenge: Option<String>,
        #[command(flatten)]
        ignore: IgnoreArgs,
    },

    /// Check whether installed challenges match their local definitions
    ///
    /// Exits 0 when all are in sync, 1 on errors or one challenge out of
    /// sync, 2 when several are out of sync.
    Verify {
        challenge: Option<String>,
        #[command(flatten)]
        ignore: IgnoreArgs,
    },

    /// Pull platform state and attachments into local definitions
    Mirror {
        challenge: Option<String>,
        /// Directory inside each challenge for downloaded attachments
        #[arg(long, default_value = "dist")]
        files_directory: String,
        /// Mirror challenges even when they verify as in sync
        #[arg(long)]
        skip_verify: bool,
        /// Create local definitions for platform-only challenges
        #[arg(long)]
        create: bool,
        #[command(flatten)]
        ignore: IgnoreArgs,
    },

    /// Commit and publish challenge changes to their upstream repositories
    Push {
        challenge: Option<String>,
        /// Do not pull after a successful push
        #[arg(long)]
        no_auto_pull: bool,
    },

    /// Pull upstream changes into challenges
    Pull {
        challenge: Option<String>,
        /// fast-forward, rebase, merge, force (subrepo), or squash
        #[arg(long, default_value = "fast-forward")]
        strategy: String,
    },

    /// Re-link added git challenges missing from the working tree
    Restore {
        /// Registry key (default: all)
        challenge: Option<String>,
    },

    /// Deploy challenge services and install or sync the challenges
    Deploy {
        challenge: Option<String>,
        /// Target host URI (overrides each challenge's host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Run a challenge's healthcheck against its deployed service
    Healthcheck {
        #[arg(default_value = ".")]
        challenge: String,
    },

    /// Rewrite challenge definitions in canonical form
    Format { challenge: Option<String> },
}

#[derive(Args)]
struct AddArgs {
    /// Git URL ending in .git, or a challenge directory
    repo: String,
    /// Subdirectory to place the challenge in
    #[arg(long)]
    directory: Option<String>,
    /// Upstream branch (subrepo only)
    #[arg(long)]
    branch: Option<String>,
    /// Overwrite an existing import (subrepo only)
    #[arg(long)]
    force: bool,
    /// Definition file name inside the challenge
    #[arg(long)]
    yaml_path: Option<String>,
}

#[derive(Args)]
struct IgnoreArgs {
    /// Field to leave untouched (repeatable)
    #[arg(long = "ignore", value_name = "FIELD")]
    fields: Vec<String>,
}

impl IgnoreArgs {
    fn parse(&self) -> Result<IgnoreSet> {
        IgnoreSet::parse(&self.fields)
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let code = match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", style(format!("{err:#}")).red());
            1
        }
    };
    std::process::exit(code);
}

fn run_cli(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    let mut ctx = ProjectContext::discover(&cwd, cli.project.as_deref())?;
    let reporter = ConsoleReporter::new();
    let quiet = cli.quiet;

    let code = match cli.command {
        Commands::Add(args) => {
            let options = AddOptions {
                repo: args.repo,
                directory: args.directory,
                branch: args.branch,
                force: args.force,
                yaml_path: args.yaml_path,
            };
            let report = AddCommand::new(&mut ctx).execute(&options)?;
            if !quiet {
                println!(
                    "{}",
                    style(format!("Added '{}'", report.key)).green()
                );
            }
            0
        }
        Commands::Install {
            challenge,
            force,
            hidden,
            ignore,
        } => {
            let options = InstallOptions {
                selector: ChallengeSelector::from_arg(challenge),
                force,
                hidden,
                ignore: ignore.parse()?,
                quiet,
            };
            InstallCommand::new(&ctx, &reporter)
                .execute(&options)?
                .exit_code()
        }
        Commands::Sync { challenge, ignore } => {
            let options = SyncOptions {
                selector: ChallengeSelector::from_arg(challenge),
                ignore: ignore.parse()?,
                quiet,
            };
            SyncCommand::new(&ctx, &reporter).execute(&options)?.exit_code()
        }
        Commands::Verify { challenge, ignore } => {
            let options = VerifyOptions {
                selector: ChallengeSelector::from_arg(challenge),
                ignore: ignore.parse()?,
                quiet,
            };
            let report = VerifyCommand::new(&ctx, &reporter).execute(&options)?;
            tracing::debug!(outcome = ?report.outcome(), "verify finished");
            report.exit_code()
        }
        Commands::Mirror {
            challenge,
            files_directory,
            skip_verify,
            create,
            ignore,
        } => {
            let options = MirrorOptions {
                selector: ChallengeSelector::from_arg(challenge),
                files_directory,
                skip_verify,
                ignore: ignore.parse()?,
                create,
                quiet,
            };
            MirrorCommand::new(&mut ctx, &reporter)
                .execute(&options)?
                .exit_code()
        }
        Commands::Push {
            challenge,
            no_auto_pull,
        } => {
            let options = PushOptions {
                selector: ChallengeSelector::from_arg(challenge),
                no_auto_pull,
                quiet,
            };
            PushCommand::new(&ctx, &reporter).execute(&options)?.exit_code()
        }
        Commands::Pull {
            challenge,
            strategy,
        } => {
            let options = PullOptions {
                selector: ChallengeSelector::from_arg(challenge),
                strategy: strategy.parse::<PullStrategy>()?,
                quiet,
            };
            PullCommand::new(&ctx, &reporter).execute(&options)?.exit_code()
        }
        Commands::Restore { challenge } => {
            let options = RestoreOptions {
                key: challenge,
                quiet,
            };
            RestoreCommand::new(&ctx, &reporter)
                .execute(&options)?
                .exit_code()
        }
        Commands::Deploy { challenge, host } => {
            let handlers = handlers::from_config(ctx.config(), ctx.shared_runner());
            let options = DeployOptions {
                selector: ChallengeSelector::from_arg(challenge),
                host,
                quiet,
            };
            DeployCommand::new(&ctx, &handlers, &reporter)
                .execute(&options)?
                .exit_code()
        }
        Commands::Healthcheck { challenge } => {
            let options = HealthcheckOptions { challenge };
            HealthcheckCommand::new(&ctx, &reporter).execute(&options)?;
            0
        }
        Commands::Format { challenge } => {
            let options = FormatOptions {
                selector: ChallengeSelector::from_arg(challenge),
                quiet,
            };
            FormatCommand::new(&ctx, &reporter).execute(&options)?.exit_code()
        }
    };
    Ok(code)
}

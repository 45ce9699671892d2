//! stalebot - closes issues that went quiet
//!
//! Meant to be run from a scheduler (cron, CI schedule). Each invocation
//! checks one repository once.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;

use stalebot::config::{parse_duration, ConfigValidator};
use stalebot::{
    BotConfig, ConfigOverrides, ConsoleReporter, GitHubClient, LogFileReporter, MultiReporter,
    Result, StaleBotError, StaleIssueRun, SystemClock, TracingReporter,
};

#[derive(Parser)]
#[command(name = "stalebot")]
#[command(version)]
#[command(about = "Close issues that went quiet after being marked for follow-up", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./stalebot.toml, then the user config dir)
    #[arg(short, long, global = true, env = "STALEBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    /// Repository owner
    #[arg(long, global = true, env = "STALEBOT_OWNER")]
    owner: Option<String>,

    /// Repository name
    #[arg(long, global = true, env = "STALEBOT_REPO")]
    repo: Option<String>,

    /// Label that marks issues for staleness tracking
    #[arg(long, global = true, env = "STALEBOT_LABEL")]
    label: Option<String>,

    /// Label that keeps an issue open regardless of age
    #[arg(long, global = true, env = "STALEBOT_FRESH_LABEL")]
    fresh_label: Option<String>,

    /// Quiet time before an issue is stale, e.g. 48h, 5m, 2d 12h
    #[arg(long, global = true, env = "STALEBOT_STALE_AFTER", value_parser = parse_duration)]
    stale_after: Option<Duration>,

    /// Append-only run log
    #[arg(long, global = true, env = "STALEBOT_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// GraphQL endpoint
    #[arg(long, global = true, env = "STALEBOT_API_URL")]
    api_url: Option<String>,

    /// Issues remediated at the same time
    #[arg(long, global = true, env = "STALEBOT_CONCURRENCY")]
    concurrency: Option<usize>,

    /// GitHub token
    #[arg(long, global = true, env = "GH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find stale issues and close them
    Run {
        /// Classify and plan, but change nothing
        #[arg(long)]
        dry_run: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or validate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the effective configuration
    Validate,

    /// Show configuration file paths
    Paths,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            tracking_label: self.label.clone(),
            fresh_label: self.fresh_label.clone(),
            stale_after: self.stale_after,
            log_file: self.log_file.clone(),
            api_url: self.api_url.clone(),
            concurrency: self.concurrency,
        }
    }

    fn token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        "stalebot=debug,info"
    } else {
        "stalebot=info,warn"
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<(BotConfig, Option<PathBuf>)> {
    let (mut config, source) = BotConfig::discover(cli.config.as_deref())?;
    config.apply_overrides(cli.overrides());
    Ok((config, source))
}

async fn run_command(cli: &Cli, dry_run: bool, json: bool) -> Result<i32> {
    let (config, _) = load_config(cli)?;
    config.validate()?;

    let token = cli
        .token()
        .ok_or_else(|| StaleBotError::config("no GitHub token (set GH_TOKEN or pass --token)"))?;
    let client = GitHubClient::new(
        &token,
        &config.api_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let mut reporter = MultiReporter::new();
    reporter = if json {
        reporter.with(TracingReporter)
    } else {
        reporter.with(ConsoleReporter::new())
    };
    if let Some(path) = &config.log_file {
        reporter = reporter.with(LogFileReporter::new(path));
    }

    let run = StaleIssueRun::new(&config, &client, &SystemClock, &reporter).dry_run(dry_run);
    match run.run().await {
        Ok(summary) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Ok(0)
        }
        // Already reported by the run's reporters.
        Err(e) => Ok(e.exit_code()),
    }
}

fn config_command(cli: &Cli, action: &ConfigAction) -> Result<i32> {
    match action {
        ConfigAction::Show { json } => {
            let (config, source) = load_config(cli)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let origin = source
                    .as_deref()
                    .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
                println!("# {} {}", "Loaded from:".cyan().bold(), origin);
                print!("{}", config.to_toml()?);
            }
            Ok(0)
        }

        ConfigAction::Validate => {
            let (config, source) = load_config(cli)?;
            match &source {
                Some(path) => println!("{} {}", "Config:".cyan().bold(), path.display()),
                None => println!("{} no config file found (using defaults)", "Info:".blue()),
            }

            let report = ConfigValidator::new(&config).validate();
            for error in &report.errors {
                eprintln!("{} {}", "Error:".red(), error);
            }
            for warning in &report.warnings {
                println!("{} {}", "Warning:".yellow(), warning);
            }
            if report.is_valid() {
                println!("{} {}", "OK".green(), report.summary());
            } else {
                eprintln!("{}", report.summary().red().bold());
            }
            Ok(report.exit_code())
        }

        ConfigAction::Paths => {
            println!("\n{} Configuration Paths", "Config:".cyan().bold());
            println!("{}", "\u{2500}".repeat(40));
            print_path("Explicit", cli.config.as_deref());
            print_path("Working dir", Some(Path::new(stalebot::config::CONFIG_FILE_NAME)));
            print_path("User", BotConfig::user_config_path().as_deref());
            Ok(0)
        }
    }
}

fn print_path(name: &str, path: Option<&Path>) {
    match path {
        Some(path) => {
            let marker = if path.exists() {
                "\u{2713}".green()
            } else {
                "-".dimmed()
            };
            println!("   {marker} {name}: {}", path.display());
        }
        None => println!("   {} {name}: (none)", "-".dimmed()),
    }
}

#[tokio::main]
async fn main() {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let result = match &cli.command {
        Commands::Run { dry_run, json } => run_command(&cli, *dry_run, *json).await,
        Commands::Config { action } => config_command(&cli, action),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

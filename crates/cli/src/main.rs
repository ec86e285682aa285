mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lde_core::{
    compose_rules, load_rules, Composer, FileSystemProvider, NamingPolicy, PlanEmitter,
    SessionReport,
};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Identifier policy as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Naming {
    Snake,
    Camel,
}

impl From<Naming> for NamingPolicy {
    fn from(n: Naming) -> Self {
        match n {
            Naming::Snake => NamingPolicy::Snake,
            Naming::Camel => NamingPolicy::Camel,
        }
    }
}

/// Line data extraction rule composer.
#[derive(Parser)]
#[command(name = "lde", version, about = "Line data extraction rule composer")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log composition steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Path to an lde.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a JSON rule set and print the operation plan
    Compose {
        /// Path to the JSON rule set
        file: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Validate a JSON rule set without printing the plan
    Check {
        /// Path to the JSON rule set
        file: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Args)]
struct SessionArgs {
    /// Identifier policy fields and options must follow
    #[arg(long, value_enum)]
    naming: Option<Naming>,

    /// Keep composing the remaining rules after a failure
    #[arg(long)]
    keep_going: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(2);
        }
    };

    match cli.command {
        Commands::Compose { file, session } => {
            cmd_compose(&file, &session, &config, cli.output, cli.quiet);
        }
        Commands::Check { file, session } => {
            cmd_check(&file, &session, &config, cli.output, cli.quiet);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_session(
    file: &Path,
    args: &SessionArgs,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) -> (PlanEmitter, SessionReport) {
    let rule_set = match load_rules(&FileSystemProvider, file) {
        Ok(r) => r,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    let policy = args
        .naming
        .map(NamingPolicy::from)
        .unwrap_or(config.naming.policy);
    let keep_going = args.keep_going || config.compose.keep_going;
    tracing::debug!(?policy, keep_going, rules = rule_set.rules.len(), "session settings");

    let normalizer = policy.normalizer();
    let composer = Composer::new(normalizer.as_ref());
    let mut emitter = PlanEmitter::new();
    let report = compose_rules(&composer, &mut emitter, &rule_set.rules, keep_going);
    (emitter, report)
}

fn cmd_compose(file: &Path, args: &SessionArgs, config: &Config, output: OutputFormat, quiet: bool) {
    let (emitter, report) = run_session(file, args, config, output, quiet);
    match output {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "rules": emitter.rules(),
                "failures": failures_json(&report),
            });
            print_json(&doc);
        }
        OutputFormat::Text => {
            print!("{}", emitter);
            report_failures(&report, quiet);
        }
    }
    if !report.is_ok() {
        process::exit(1);
    }
}

fn cmd_check(file: &Path, args: &SessionArgs, config: &Config, output: OutputFormat, quiet: bool) {
    let (_, report) = run_session(file, args, config, output, quiet);
    match output {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "composed": report.composed,
                "failures": failures_json(&report),
                "skipped": report.skipped,
            });
            print_json(&doc);
        }
        OutputFormat::Text => {
            if report.is_ok() {
                if !quiet {
                    println!("ok: {} rule(s)", report.composed.len());
                }
            } else {
                report_failures(&report, quiet);
            }
        }
    }
    if !report.is_ok() {
        process::exit(1);
    }
}

fn failures_json(report: &SessionReport) -> Vec<serde_json::Value> {
    report.failures.iter().map(|e| e.to_json_value()).collect()
}

fn print_json(doc: &serde_json::Value) {
    let pretty =
        serde_json::to_string_pretty(doc).unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

fn report_failures(report: &SessionReport, quiet: bool) {
    for err in &report.failures {
        eprintln!("rule {}: {}", err.rule, err);
    }
    if report.skipped > 0 && !quiet {
        eprintln!("{} rule(s) not composed after the first failure", report.skipped);
    }
}

/// Report an error message to stderr in the appropriate format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::json!({ "error": msg });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&err_json).unwrap_or_else(|_| msg.to_string())
            );
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", msg);
            }
        }
    }
}

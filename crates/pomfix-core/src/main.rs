//! `pomfix` command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pomfix_core::errors::exit_codes;
use pomfix_core::listing::{generate_list, ListKind};
use pomfix_core::models::resolve;
use pomfix_core::pipeline::{fix_manifest, fix_properties};
use pomfix_core::{BuildConfig, FixOutcome, Pipeline, PomfixResult, TargetKind, TargetReport};

/// Keep build files in step with the project's pom.xml
#[derive(Parser, Debug)]
#[command(name = "pomfix", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Project root; other default paths are relative to it
    #[arg(long, global = true, env = "POMFIX_ROOT", default_value = ".")]
    root: PathBuf,

    /// Project descriptor
    #[arg(long, global = true, env = "POMFIX_POM")]
    pom: Option<PathBuf>,

    /// Namespace cache directory
    #[arg(long, global = true, env = "POMFIX_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite the configuration, build file and manifest (default)
    Fix {
        /// Leave a target alone
        #[arg(long, value_enum)]
        skip: Vec<SkipTarget>,
    },
    /// Fill placeholders in a manifest
    FixManifest {
        input: PathBuf,
        /// Defaults to rewriting INPUT in place
        output: Option<PathBuf>,
    },
    /// Fill placeholders in a .properties file
    FixProperties {
        input: PathBuf,
        /// Defaults to rewriting INPUT in place
        output: Option<PathBuf>,
    },
    /// Print one namespace value (empty line when unset)
    Get { key: String },
    /// Write the sorted source or class file listing
    List {
        #[arg(value_enum)]
        kind: ListTarget,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SkipTarget {
    Xml,
    BuildFile,
    Manifest,
}

impl From<SkipTarget> for TargetKind {
    fn from(t: SkipTarget) -> Self {
        match t {
            SkipTarget::Xml => TargetKind::Xml,
            SkipTarget::BuildFile => TargetKind::BuildFile,
            SkipTarget::Manifest => TargetKind::Manifest,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ListTarget {
    Sources,
    Classes,
}

impl From<ListTarget> for ListKind {
    fn from(t: ListTarget) -> Self {
        match t {
            ListTarget::Sources => ListKind::Sources,
            ListTarget::Classes => ListKind::Classes,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::BAD_ARGUMENTS
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("pomfix: {}: {}", e.category(), e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> BuildConfig {
    let mut config = BuildConfig::from_root(&cli.root);
    if let Some(pom) = &cli.pom {
        config = config.with_descriptor(pom);
    }
    if let Some(dir) = &cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    config
}

fn log_report(report: &TargetReport) {
    info!(
        file = %report.path.display(),
        kind = %report.kind,
        changed = report.status.changed(),
        "target fixed"
    );
}

fn run(cli: Cli) -> PomfixResult<u8> {
    let mut config = build_config(&cli);
    debug!(config = ?config, "configuration");

    match cli.command.unwrap_or(Commands::Fix { skip: Vec::new() }) {
        Commands::Fix { skip } => {
            for target in skip {
                config.skip(target.into());
            }
            match Pipeline::new(config).run()? {
                FixOutcome::Done { reports } => {
                    let changed = reports.iter().filter(|r| r.status.changed()).count();
                    info!(targets = reports.len(), changed, "fix complete");
                    Ok(exit_codes::SUCCESS)
                }
                FixOutcome::RestartRequired { path, .. } => {
                    eprintln!(
                        "pomfix: {} was updated; run the build again",
                        path.display()
                    );
                    Ok(exit_codes::RESTART_REQUIRED)
                }
            }
        }
        Commands::FixManifest { input, output } => {
            let namespace = Pipeline::new(config).namespace()?;
            let report = fix_manifest(&input, output.as_deref(), &namespace)?;
            log_report(&report);
            Ok(exit_codes::SUCCESS)
        }
        Commands::FixProperties { input, output } => {
            let namespace = Pipeline::new(config).namespace()?;
            let report = fix_properties(&input, output.as_deref(), &namespace)?;
            log_report(&report);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Get { key } => {
            let namespace = Pipeline::new(config).namespace()?;
            println!("{}", resolve(&namespace, &key).unwrap_or_default());
            Ok(exit_codes::SUCCESS)
        }
        Commands::List { kind } => {
            let report = generate_list(kind.into(), &config)?;
            info!(file = %report.path.display(), entries = report.entries, "listing");
            Ok(exit_codes::SUCCESS)
        }
    }
}

//! `expframe` command-line entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use expframe_cli::{apply, export, validate, ReportFormat};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Experiment configuration file (.yaml, .yml or .json)")
}

fn cli() -> Command {
    Command::new("expframe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("ExperimentFramework registration plan tooling")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("plan")
                .about("Build, inspect and apply registration plans")
                .subcommand_required(true)
                .subcommand(
                    Command::new("export")
                        .about("Write a plan report")
                        .arg(config_arg())
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("text")
                                .value_parser(["text", "json"])
                                .help("Report format"),
                        )
                        .arg(
                            Arg::new("out")
                                .long("out")
                                .value_parser(value_parser!(PathBuf))
                                .help("Output file (stdout when omitted)"),
                        ),
                )
                .subcommand(
                    Command::new("validate")
                        .about("Print error and warning findings with the plan summary")
                        .arg(config_arg()),
                )
                .subcommand(
                    Command::new("apply")
                        .about("Execute the plan against the configured registry")
                        .arg(config_arg())
                        .arg(
                            Arg::new("dry-run")
                                .long("dry-run")
                                .action(ArgAction::SetTrue)
                                .help("Validate only; do not mutate"),
                        ),
                ),
        )
}

fn run(matches: &ArgMatches) -> anyhow::Result<bool> {
    let Some(("plan", plan)) = matches.subcommand() else {
        anyhow::bail!("unknown command");
    };

    match plan.subcommand() {
        Some(("export", args)) => {
            let config = args
                .get_one::<PathBuf>("config")
                .context("--config is required")?;
            let format: ReportFormat = args
                .get_one::<String>("format")
                .map_or(Ok(ReportFormat::default()), |f| f.parse())?;

            match args.get_one::<PathBuf>("out") {
                Some(path) => {
                    let mut file = File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    let valid = export(config, format, &mut file)?;
                    file.flush()?;
                    Ok(valid)
                }
                None => export(config, format, &mut io::stdout().lock()),
            }
        }
        Some(("validate", args)) => {
            let config = args
                .get_one::<PathBuf>("config")
                .context("--config is required")?;
            validate(config, &mut io::stdout().lock())
        }
        Some(("apply", args)) => {
            let config = args
                .get_one::<PathBuf>("config")
                .context("--config is required")?;
            apply(config, args.get_flag("dry-run"), &mut io::stdout().lock())
        }
        _ => anyhow::bail!("unknown plan command"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let matches = cli().get_matches();

    let code = match run(&matches) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

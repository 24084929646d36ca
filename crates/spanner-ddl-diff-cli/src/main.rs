//! spanner-ddl-diff CLI - generate the ALTER statements that convert one
//! Cloud Spanner DDL file into another.

use clap::Parser;
use spanner_ddl_diff::{DdlDiff, DdlDiffError, DiffOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "spanner-ddl-diff")]
#[command(about = "Compares two Cloud Spanner Schema (DDL) files and generates the ALTER statements to convert one to the other")]
#[command(version)]
struct Cli {
    /// Path to the original (current) DDL file
    #[arg(long = "originalDdlFile")]
    original_ddl_file: PathBuf,

    /// Path to the new (target) DDL file
    #[arg(long = "newDdlFile")]
    new_ddl_file: PathBuf,

    /// Path to write the generated difference statements to
    #[arg(long = "outputDdlFile")]
    output_ddl_file: PathBuf,

    /// Permit drop-and-recreate of modified indexes
    #[arg(long = "allowRecreateIndexes")]
    allow_recreate_indexes: bool,

    /// Permit drop-and-recreate of modified constraints
    #[arg(long = "allowRecreateConstraints")]
    allow_recreate_constraints: bool,

    /// Emit DROP statements for removed tables, columns, indexes and change streams
    #[arg(long = "allowDropStatements")]
    allow_drop_statements: bool,

    /// Optional YAML or JSON file with policy defaults; explicit flags add to it
    #[arg(long = "configFile")]
    config_file: Option<PathBuf>,

    /// Log format: text or json
    #[arg(long = "logFormat", default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), DdlDiffError> {
    setup_logging(&cli.verbosity, &cli.log_format).map_err(DdlDiffError::Config)?;

    let options = effective_options(&cli)?;

    let original_ddl = std::fs::read_to_string(&cli.original_ddl_file)?;
    let new_ddl = std::fs::read_to_string(&cli.new_ddl_file)?;

    let statements =
        DdlDiff::build(&original_ddl, &new_ddl)?.generate_difference_statements(&options)?;
    info!(
        "Generated {} statements from {:?} -> {:?}",
        statements.len(),
        cli.original_ddl_file,
        cli.new_ddl_file
    );

    let mut output = String::new();
    for statement in &statements {
        output.push_str(statement);
        output.push_str(";\n\n");
    }
    std::fs::write(&cli.output_ddl_file, output)?;

    Ok(())
}

/// Policy from the optional config file, with explicit flags layered on top.
fn effective_options(cli: &Cli) -> Result<DiffOptions, DdlDiffError> {
    let mut options = match &cli.config_file {
        Some(path) => DiffOptions::load(path)?,
        None => DiffOptions::default(),
    };
    if cli.allow_recreate_indexes {
        options.allow_recreate_indexes = true;
    }
    if cli.allow_recreate_constraints {
        options.allow_recreate_constraints = true;
    }
    if cli.allow_drop_statements {
        options.allow_drop_statements = true;
    }
    Ok(options)
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity: {other}")),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

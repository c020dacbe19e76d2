mod config;
mod render;
mod server;

use clap::{Parser, Subcommand};
use config::AppConfig;
use log::{error, info};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;
use timetable_solver::decode::Timetable;
use timetable_solver::report::ScheduleReport;
use timetable_solver::{SchedulingInput, ValidationError, solver};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to export the timetable: {0}")]
    Export(#[from] csv::Error),

    #[error("invalid input: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("server error: {0}")]
    Server(#[from] io::Error),
}

/// Weekly course timetabling.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (the default).
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Solve one instance and print the timetable.
    Solve {
        /// JSON file with the scheduling input.
        #[arg(required_unless_present = "sample")]
        input: Option<PathBuf>,
        /// Use the built-in five-course week instead of a file.
        #[arg(long, conflicts_with = "input")]
        sample: bool,
        /// Also write the timetable as delimited text.
        #[arg(long)]
        export: Option<PathBuf>,
        /// Single ASCII character separating exported fields.
        #[arg(long, default_value = ",", value_parser = parse_delimiter)]
        delimiter: u8,
        #[arg(long)]
        time_limit_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();

    let result = match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            server::run_server(config).await
        }
        Command::Solve {
            input,
            sample,
            export,
            delimiter,
            time_limit_ms,
        } => {
            if let Some(ms) = time_limit_ms {
                config.time_limit = Duration::from_millis(ms);
            }
            let input = match (sample, input) {
                (true, _) | (false, None) => Ok(SchedulingInput::sample()),
                (false, Some(path)) => read_input(&path),
            };
            input.and_then(|input| solve_once(&input, &config, export.as_deref(), delimiter))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("expected a single ASCII character, got '{}'", raw)),
    }
}

fn read_input(path: &Path) -> Result<SchedulingInput, AppError> {
    let raw = fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn solve_once(
    input: &SchedulingInput,
    config: &AppConfig,
    export: Option<&Path>,
    delimiter: u8,
) -> Result<(), AppError> {
    let problem = input.build()?;
    let budget = input
        .time_limit_ms
        .map(Duration::from_millis)
        .unwrap_or(config.time_limit);

    let result = solver::solve(&problem, budget);
    let report = ScheduleReport::calculate(&problem, &result);

    let Some(assignment) = result.outcome.assignment() else {
        println!("No feasible timetable found.");
        return Ok(());
    };
    if !report.all_quotas_met() {
        println!("Time limit reached; showing the best partial timetable.");
    }

    let timetable = Timetable::decode(&problem, assignment);
    println!("Weekly Timetable (Rows = Days, Columns = Periods)");
    print!("{}", render::grid(&timetable));
    for course in &report.courses {
        println!(
            "{:12} | Faculty: {:6} | {}/{} lectures",
            course.course, course.faculty, course.scheduled, course.required
        );
    }
    println!(
        "Utilization: {}/{} ({:.1}%), {} decisions in {:.2?}",
        report.utilization.occupied,
        report.utilization.capacity,
        report.utilization.ratio * 100.0,
        report.statistics.decisions,
        report.statistics.elapsed
    );

    if let Some(path) = export {
        let file = fs::File::create(path).map_err(|source| AppError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        render::delimited(&timetable, delimiter, file)?;
        info!("Timetable exported to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_must_be_one_ascii_byte() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\t"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("§").is_err());
        assert!(parse_delimiter("").is_err());
    }
}

//! `stripmap` command-line tool.
//!
//! `plan` runs one configured query and prints its metrics; `bench` runs the
//! base and exact planners over every instance below a directory.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stripmap::report::{self, planner_id, write_json, BenchReport, RunFailure};
use stripmap::{load_instance, Error, PlanConfig, PlannerVariant};

#[derive(Parser, Debug)]
#[command(name = "stripmap", version, about = "Coverage path planning for polygons with holes")]
struct Cli {
    /// Log level when STRIPMAP_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a coverage path for one configured instance.
    Plan {
        /// JSON run configuration.
        config: PathBuf,
        /// Write metrics and path here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run base and exact planners over every instance file in a directory tree.
    Bench {
        /// Directory searched recursively for `*.json` instances.
        instances: PathBuf,
        /// Configuration overriding the benchmark defaults; its `instance` is ignored.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Report destination.
        #[arg(short, long, default_value = "bench_report.json")]
        output: PathBuf,
    },
}

fn init_logging(level: LevelFilter) {
    #[cfg(feature = "tracing")]
    {
        let _ = level;
        stripmap::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    if let Err(err) = stripmap::core::init_with_level(level) {
        eprintln!("logger init failed: {err}");
    }
}

#[derive(serde::Serialize)]
struct PlanOutput<'a> {
    metrics: &'a stripmap::PlanMetrics,
    path: Vec<[f64; 2]>,
}

fn plan(config_path: &Path, output: Option<&Path>) -> Result<(), Error> {
    let config = PlanConfig::load_json(config_path)?;
    let outcome = report::run(&config, config.polygon()?)?;
    let out = PlanOutput {
        metrics: &outcome.metrics,
        path: outcome.solution.path.iter().map(|p| [p.x, p.y]).collect(),
    };
    match output {
        Some(path) => {
            write_json(path, &out)?;
            log::info!("wrote {}", path.display());
        }
        None => {
            let json =
                serde_json::to_string_pretty(&out).map_err(stripmap::IoError::Serialize)?;
            println!("{json}");
        }
    }
    Ok(())
}

fn collect_instances(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), stripmap::IoError> {
    let read_err = |source: std::io::Error| stripmap::IoError::Read {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_dir() {
            collect_instances(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "json") {
            out.push(path);
        }
    }
    Ok(())
}

fn bench(instances: &Path, config: Option<&Path>, output: &Path) -> Result<BenchReport, Error> {
    let base = match config {
        Some(path) => PlanConfig::load_json(path)?,
        None => PlanConfig::benchmark(),
    };
    let mut files = Vec::new();
    collect_instances(instances, &mut files)?;
    files.sort();
    log::info!("benchmarking {} instances from {}", files.len(), instances.display());

    let mut report = BenchReport::default();
    for file in &files {
        let polygon = match load_instance(file, base.resolution) {
            Ok(polygon) => polygon,
            Err(err) => {
                log::warn!("skipping {}: {err}", file.display());
                report.failures.push(RunFailure {
                    planner: String::new(),
                    instance: file.clone(),
                    error: err.to_string(),
                });
                continue;
            }
        };
        for variant in [PlannerVariant::Base, PlannerVariant::Exact] {
            let mut run_config = base.clone();
            run_config.instance = Some(file.clone());
            run_config.planner.variant = variant;
            match report::run(&run_config, polygon.clone()) {
                Ok(outcome) => report.runs.push(outcome.metrics),
                Err(err) => {
                    log::warn!("{} on {}: {err}", planner_id(variant), file.display());
                    report.failures.push(RunFailure {
                        planner: planner_id(variant).to_string(),
                        instance: file.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
    }
    report.write_json(output)?;
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let result = match &cli.command {
        Command::Plan { config, output } => plan(config, output.as_deref()),
        Command::Bench {
            instances,
            config,
            output,
        } => bench(instances, config.as_deref(), output).map(|report| {
            println!(
                "{} runs, {} failures, report written to {}",
                report.runs.len(),
                report.failures.len(),
                output.display()
            );
        }),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

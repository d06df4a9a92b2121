// src/main.rs
mod config;
mod drivers;
mod recorder;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use crate::config::AnalysisConfig;
use crate::drivers::{AnalysisError, FrequencyResponsePipeline, PeakComparisonPipeline};
use crate::recorder::{record_serial, CaptureLimits, CaptureSettings};
/// Post-processing for acoustics lab measurements.
#[derive(Parser)]
#[command(name = "acoustilab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}
/// Options shared by both analyses.
#[derive(clap::Args)]
struct RunArgs {
    /// JSON configuration file (defaults to the built-in lab setup)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Directory charts are written to
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Print the summary without writing charts
    #[arg(long)]
    no_save: bool,
}
impl RunArgs {
    fn load_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if self.no_save {
            config.output.save = false;
        }
        Ok(config)
    }
}
#[derive(Subcommand)]
enum Commands {
    /// Mean ± std frequency response of each group of instrument exports
    FrequencyResponse(RunArgs),
    /// Peak-aligned comparison of peak-to-peak microphone logs
    PeakToPeak(RunArgs),
    /// Capture peak-to-peak readings from a serial device into a CSV log
    Record {
        /// Serial device, e.g. /dev/ttyACM0 or COM4
        #[arg(long, default_value = "/dev/ttyACM0")]
        port: String,
        #[arg(long, default_value_t = 115_200)]
        baud: u32,
        /// CSV file to write
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Stop after this many seconds
        #[arg(long)]
        duration_secs: Option<f64>,
        /// Stop after this many samples
        #[arg(long)]
        max_samples: Option<usize>,
    },
    /// Print the built-in configuration as JSON
    DefaultConfig,
}
fn run_frequency_response(args: &RunArgs) -> Result<()> {
    let config = args.load_config()?;
    let pipeline = FrequencyResponsePipeline::new(&config.frequency_response, &config.output);
    let report = pipeline.run()?;
    for curve in &report.curves {
        let peak = curve
            .mean_db
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        println!(
            "{}: {} points, max mean amplitude {:.2} dB",
            curve.label,
            curve.mean_db.len(),
            peak
        );
    }
    for path in &report.written {
        println!("Saved plot as '{}'", path.display());
    }
    Ok(())
}
fn run_peak_to_peak(args: &RunArgs) -> Result<()> {
    let config = args.load_config()?;
    let pipeline = PeakComparisonPipeline::new(&config.peak_to_peak, &config.output);
    let report = pipeline.run()?;
    for aligned in &report.aligned {
        debug!("'{}' shifted by {:+.3}s", aligned.trial.label, aligned.shift_secs);
    }
    for summary in &report.summaries {
        println!("Mean Peak-to-Peak ({}): {:.2}", summary.label, summary.mean);
    }
    for summary in &report.summaries {
        if let Some(diff) = summary.difference_pct {
            println!("Difference in % ({}): {diff:.2}%", summary.label);
        }
    }
    if let Some(path) = &report.written {
        println!("Plot saved as '{}'", path.display());
    }
    Ok(())
}
fn capture_duration(secs: Option<f64>) -> Result<Option<Duration>> {
    let Some(secs) = secs else {
        return Ok(None);
    };
    anyhow::ensure!(secs > 0.0, "--duration-secs must be positive, got {secs}");
    let duration = Duration::try_from_secs_f64(secs)
        .with_context(|| format!("--duration-secs {secs} is out of range"))?;
    Ok(Some(duration))
}
fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::FrequencyResponse(args) => run_frequency_response(&args),
        Commands::PeakToPeak(args) => run_peak_to_peak(&args),
        Commands::Record {
            port,
            baud,
            output,
            duration_secs,
            max_samples,
        } => {
            let settings = CaptureSettings {
                port,
                baud_rate: baud,
                output,
                limits: CaptureLimits {
                    duration: capture_duration(duration_secs)?,
                    max_samples,
                },
            };
            debug!("capture settings: {settings:?}");
            record_serial(&settings).context("Serial capture failed")?;
            Ok(())
        }
        Commands::DefaultConfig => {
            println!("{}", AnalysisConfig::default().to_json()?);
            Ok(())
        }
    }
}
// 入口函数
fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // 缺失的测量文件会让整次对比失效，直接给出提示并退出
            match err.downcast_ref::<AnalysisError>() {
                Some(analysis) if analysis.is_missing_file() => eprintln!("{analysis}"),
                _ => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn duration_flag_is_validated() {
        assert_eq!(capture_duration(None).unwrap(), None);
        assert_eq!(
            capture_duration(Some(2.5)).unwrap(),
            Some(Duration::from_millis(2500))
        );
        assert!(capture_duration(Some(0.0)).is_err());
        assert!(capture_duration(Some(-1.0)).is_err());
        assert!(capture_duration(Some(f64::NAN)).is_err());
        assert!(capture_duration(Some(f64::INFINITY)).is_err());
        assert!(capture_duration(Some(1e30)).is_err());
    }
    #[test]
    fn record_arguments_parse() {
        let cli = Cli::try_parse_from([
            "acoustilab",
            "-vv",
            "record",
            "--output",
            "logs/tube_PU_1.csv",
            "--duration-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Record {
                port,
                baud,
                duration_secs,
                ..
            } => {
                assert_eq!(port, "/dev/ttyACM0");
                assert_eq!(baud, 115_200);
                assert_eq!(duration_secs, Some(30.0));
            }
            _ => panic!("expected the record subcommand"),
        }
    }
}

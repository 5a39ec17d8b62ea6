//! CLI front end for the k-mer counting performance model
//!
//! Usage:
//!   dakc_model predict --partitions 8
//!   dakc_model --config run.json datasets
//!   dakc_model --json scaling --start 4 --bound 65536
//!   dakc_model memory --start 256 --bound 16384
//!   dakc_model compare --partitions 16

use clap::{Parser, Subcommand};
use dakc_model::model::memory::to_mib;
use dakc_model::model::params::isopower_partitions;
use dakc_model::model::{
    CombinePolicy, HardwareParameters, PhaseTerms, TimePrediction, Utilization,
};
use dakc_model::sweep::{self, PartitionSweep};
use dakc_model::{ModelConfig, ModelError, Result, TimeEstimator};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dakc_model")]
#[command(about = "Analytical time and memory model for distributed k-mer counting")]
#[command(version)]
struct Args {
    /// JSON configuration file (defaults to the reference setup)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of a text table
    #[arg(long, global = true)]
    json: bool,

    /// Override the configured combination policy (sum or max)
    #[arg(long, global = true)]
    policy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// End-to-end prediction with phase and resource breakdown
    Predict {
        #[arg(long)]
        partitions: Option<u64>,
    },
    /// Time and cache-miss predictions across the configured datasets
    Datasets {
        #[arg(long)]
        partitions: Option<u64>,
    },
    /// Strong-scaling sweep of time and resource utilization
    Scaling {
        #[arg(long, default_value_t = 4)]
        start: u64,
        #[arg(long, default_value_t = 1 << 15)]
        bound: u64,
    },
    /// Aggregation memory per topology over a partition sweep
    Memory {
        #[arg(long, default_value_t = 256)]
        start: u64,
        #[arg(long, default_value_t = 1 << 14)]
        bound: u64,
    },
    /// GPU nodes against CPU nodes drawing the same power
    Compare {
        #[arg(long)]
        partitions: Option<u64>,
    },
}

#[derive(Serialize)]
struct PredictReport {
    partitions: u64,
    prediction: TimePrediction,
    phase1: PhaseTerms,
    phase2: PhaseTerms,
    utilization: Utilization,
}

#[derive(Serialize)]
struct CompareRow {
    platform: &'static str,
    #[serde(flatten)]
    point: sweep::ScalingPoint,
}

/// One checked prediction for `platform` at `partitions`
fn compare_row(
    platform: &'static str,
    estimator: &TimeEstimator,
    config: &ModelConfig,
    partitions: u64,
) -> Result<CompareRow> {
    let range = PartitionSweep::single(partitions)?;
    let points = sweep::time_sweep(estimator, &config.workload, &range, config.policy)?;
    let point = points.into_iter().next().ok_or_else(|| {
        ModelError::InvalidSweep(format!("no partition count at P={}", partitions))
    })?;
    Ok(CompareRow { platform, point })
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(error) = run(args) {
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ModelConfig::load(path)?,
        None => ModelConfig::default(),
    };
    if let Some(policy) = &args.policy {
        config.policy = policy.parse::<CombinePolicy>()?;
    }
    info!(
        "Workload: {} reads x {} chars, k={}",
        config.workload.read_count, config.workload.read_len, config.workload.k
    );

    let estimator = TimeEstimator::new(config.hardware);

    match args.command {
        Commands::Predict { partitions } => {
            let partitions = partitions.unwrap_or(config.partitions);
            // run the positivity checks before reporting anything
            let range = PartitionSweep::single(partitions)?;
            sweep::time_sweep(&estimator, &config.workload, &range, config.policy)?;

            let report = PredictReport {
                partitions,
                prediction: estimator.predict(&config.workload, partitions, config.policy),
                phase1: estimator.phase1_terms(&config.workload, partitions),
                phase2: estimator.phase2_terms(&config.workload, partitions),
                utilization: estimator.utilization(&config.workload, partitions),
            };
            if args.json {
                print_json(&report)?;
            } else {
                print_prediction(&report);
            }
        }
        Commands::Datasets { partitions } => {
            let partitions = partitions.unwrap_or(config.partitions);
            let points =
                sweep::dataset_sweep(&estimator, &config.workload, &config.datasets, partitions)?;
            if args.json {
                print_json(&points)?;
            } else {
                println!("Datasets at P={}", partitions);
                println!(
                    "{:<8} {:>14} {:>12} {:>12} {:>12} {:>12} {:>12} {:>16} {:>16} \
                     {:>9} {:>9} {:>9}",
                    "dataset", "reads", "total(max)", "total(sum)", "p1(max)", "p1(sum)", "p2",
                    "p1 misses", "p2 misses", "compute", "intra", "inter"
                );
                for p in &points {
                    println!(
                        "{:<8} {:>14} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>16.0} \
                         {:>16.0} {:>9.3} {:>9.3} {:>9.3}",
                        p.dataset.name(),
                        p.read_count,
                        p.total_max,
                        p.total_sum,
                        p.phase1_max,
                        p.phase1_sum,
                        p.phase2,
                        p.parse_cache_misses,
                        p.sort_cache_misses,
                        p.utilization.compute,
                        p.utilization.intra,
                        p.utilization.inter
                    );
                }
            }
        }
        Commands::Scaling { start, bound } => {
            let range = PartitionSweep::new(start, bound)?;
            let times = sweep::time_sweep(&estimator, &config.workload, &range, config.policy)?;
            let shares = sweep::utilization_sweep(&estimator, &config.workload, &range)?;
            if args.json {
                #[derive(Serialize)]
                struct ScalingReport<'a> {
                    policy: CombinePolicy,
                    times: &'a [sweep::ScalingPoint],
                    utilization: &'a [sweep::UtilizationPoint],
                }
                print_json(&ScalingReport {
                    policy: config.policy,
                    times: &times,
                    utilization: &shares,
                })?;
            } else {
                println!("Strong scaling ({} policy)", config.policy);
                println!(
                    "{:>8} {:>12} {:>12} {:>12} {:>9} {:>9} {:>9}",
                    "P", "phase1 s", "phase2 s", "total s", "compute", "intra", "inter"
                );
                for (t, u) in times.iter().zip(&shares) {
                    println!(
                        "{:>8} {:>12.6} {:>12.6} {:>12.6} {:>9.3} {:>9.3} {:>9.3}",
                        t.partitions, t.phase1, t.phase2, t.total, u.compute, u.intra, u.inter
                    );
                }
            }
        }
        Commands::Memory { start, bound } => {
            let range = PartitionSweep::new(start, bound)?;
            let points = sweep::memory_sweep(&config.workload, &config.buffers, &range)?;
            if args.json {
                print_json(&points)?;
            } else {
                println!("Memory per partition (MiB)");
                println!(
                    "{:>8} {:>14} {:>12} {:>12} {:>12}",
                    "P", "algorithm", "1D buf", "2D buf", "3D buf"
                );
                for p in &points {
                    println!(
                        "{:>8} {:>14.2} {:>12.2} {:>12.2} {:>12.2}",
                        p.partitions,
                        to_mib(p.algorithm),
                        to_mib(p.one_d),
                        to_mib(p.two_d),
                        to_mib(p.three_d)
                    );
                }
            }
        }
        Commands::Compare { partitions } => {
            let partitions = partitions.unwrap_or(config.partitions);
            let gpu = HardwareParameters::h100();
            let cpu_partitions = isopower_partitions(&config.hardware, &gpu, partitions)
                .map(|p| p.round().max(1.0) as u64)
                .unwrap_or(partitions);

            let rows = [
                compare_row("cpu", &estimator, &config, cpu_partitions)?,
                compare_row("h100", &TimeEstimator::new(gpu), &config, partitions)?,
            ];
            if args.json {
                print_json(&rows)?;
            } else {
                println!("Isopower comparison ({} policy)", config.policy);
                for row in &rows {
                    println!(
                        "{:<6} P={:<6} phase1 {:.6} s  phase2 {:.6} s  total {:.6} s",
                        row.platform,
                        row.point.partitions,
                        row.point.phase1,
                        row.point.phase2,
                        row.point.total
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_prediction(report: &PredictReport) {
    let p = &report.prediction;
    println!("Prediction at P={} ({} policy)", report.partitions, p.policy);
    println!("  phase 1: {:.6} s", p.phase1);
    println!(
        "    compute {:.6} s, intra-node {:.6} s, inter-node {:.6} s",
        report.phase1.compute, report.phase1.intra, report.phase1.inter
    );
    println!("  phase 2: {:.6} s", p.phase2);
    println!(
        "    compute {:.6} s, intra-node {:.6} s",
        report.phase2.compute, report.phase2.intra
    );
    println!("  total:   {:.6} s", p.total);
    println!(
        "  utilization: compute {:.1}%, intra-node {:.1}%, inter-node {:.1}%",
        report.utilization.compute * 100.0,
        report.utilization.intra * 100.0,
        report.utilization.inter * 100.0
    );
}

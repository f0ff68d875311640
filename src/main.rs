use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{debug, info};
use sysinfo::{get_current_pid, ProcessExt, System, SystemExt};

use stroke_risk::config::{init_logging, TrainingConfig};
use stroke_risk::pipeline;
use stroke_risk::StrokeError;

#[derive(Parser, Debug)]
#[command(name = "stroke-train", author, version, about = "Train the stroke risk model", long_about = None)]
struct TrainArgs {
    #[arg(short, long, help = "Input CSV path")]
    input: Option<PathBuf>,
    #[arg(short, long, help = "Where to write the model artifact")]
    model_out: Option<PathBuf>,
    #[arg(short, long, help = "Directory for the estimator sweep CSV")]
    report_dir: Option<PathBuf>,
    #[arg(short, long, help = "Also write the cleaned and balanced tables as parquet under this directory")]
    export_dir: Option<PathBuf>,
    #[arg(short, long, help = "Features kept by each selector")]
    k: Option<usize>,
    #[arg(long, help = "Trees in the persisted forest")]
    n_trees: Option<usize>,
    #[arg(long, help = "Seed for balancing, splitting and every forest")]
    seed: Option<u64>,
    #[arg(long, help = "Share of rows held out for testing")]
    test_size: Option<f32>,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Verbose level")]
    verbose: u8,
}

impl TrainArgs {
    fn into_config(self) -> TrainingConfig {
        let mut cfg = TrainingConfig::default();
        if let Some(seed) = self.seed {
            cfg = cfg.with_seed(seed);
        }
        if let Some(input) = self.input {
            cfg.input = input;
        }
        if let Some(model_out) = self.model_out {
            cfg.model_out = model_out;
        }
        if let Some(report_dir) = self.report_dir {
            cfg.report_dir = report_dir;
        }
        cfg.export_dir = self.export_dir;
        if let Some(k) = self.k {
            cfg.k_features = k;
        }
        if let Some(n_trees) = self.n_trees {
            cfg.final_forest = cfg.final_forest.with_n_trees(n_trees);
        }
        if let Some(test_size) = self.test_size {
            cfg.test_size = test_size;
        }
        cfg
    }
}

/// Resident memory of this process in bytes, 0 when unavailable.
fn monitor_memory() -> u64 {
    let Ok(pid) = get_current_pid() else {
        return 0;
    };
    let mut sys = System::new();
    sys.refresh_process(pid);
    sys.process(pid).map(|p| p.memory()).unwrap_or(0)
}

fn main() -> Result<(), StrokeError> {
    let args = TrainArgs::parse();
    init_logging(args.verbose);
    debug!("Arguments {:#?}", args);

    let start_time = Instant::now();
    let cfg = args.into_config();
    let report = pipeline::run(&cfg)?;
    println!("{report}");

    info!("time elapsed: {:?}", start_time.elapsed());
    info!("resident memory: {} MiB", monitor_memory() / (1024 * 1024));
    Ok(())
}

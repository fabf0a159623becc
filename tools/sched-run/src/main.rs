use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use dslab_sched::config::Config;
use dslab_sched::simulation::CpuSimulation;
use dslab_sched::workload;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs a CPU scheduling simulation from a config file and a job set
struct Args {
    /// Path to YAML file with simulation configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Path to CSV file with the job set
    #[arg(short, long)]
    jobs: PathBuf,

    /// Path to produced JSON file with simulation results
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
    let args = Args::parse();

    let config = match Config::from_yaml(&args.config) {
        Ok(config) => config,
        Err(status) => {
            eprintln!("{}", status);
            std::process::exit(1);
        }
    };
    let jobs = match workload::read_jobs(&args.jobs) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("cannot read job set: {}", e);
            std::process::exit(1);
        }
    };

    let mut sim = CpuSimulation::new(config);
    sim.add_jobs(&jobs);
    let result = sim.run();
    if !result.status.is_ok() {
        eprintln!("{}", result.status);
    }
    result
        .aggregates
        .print_summary("simulation", result.completions.len());

    if let Some(output) = args.output {
        std::fs::File::create(output)?
            .write_all(serde_json::to_string_pretty(&result).unwrap().as_bytes())?;
    }
    Ok(())
}

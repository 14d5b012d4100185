//! node_input_recorder CLI

use clap::Parser;
use node_input_recorder::{record_node_inputs, RecorderOptions};
use std::{path::PathBuf, process, time::Duration};

#[derive(Parser)]
#[command(name = "node_input_recorder")]
#[command(
    about = "Dump a ROS 2 node's parameters, write its relaunch command and record its input topics",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Target configuration file, or a directory with basic_info.yaml and remappings.yaml
    config: PathBuf,

    /// Directory that receives the timestamped session directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Seconds to wait for discovery before querying the node
    #[arg(long, default_value_t = 5.0, value_parser = parse_seconds)]
    discovery_wait: f64,

    /// Only dump parameters and write the launch script
    #[arg(long)]
    no_record: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("Invalid number of seconds: {}", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("Discovery wait must be a non-negative number: {}", s));
    }
    Ok(secs)
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let options = RecorderOptions {
        output_root: cli.output_dir,
        discovery_wait: Duration::from_secs_f64(cli.discovery_wait),
        record_bag: !cli.no_record,
    };

    match record_node_inputs(&cli.config, options) {
        Ok(artifacts) => {
            log::info!("Session written to {}", artifacts.session_dir.display());
            log::info!("  parameters:    {}", artifacts.params_file.display());
            log::info!("  launch script: {}", artifacts.launch_script.display());
            if let Some(bag) = &artifacts.bag {
                log::info!("  bag:           {}", bag.display());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

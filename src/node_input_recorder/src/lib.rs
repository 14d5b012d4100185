//! node_input_recorder library
//!
//! Captures what is needed to replay a running ROS 2 node offline: its
//! parameters, a command to relaunch it, and a bag of its input topics.

pub mod bag;
pub mod config;
pub mod error;
pub mod introspect;
pub mod manifest;
pub mod params;
pub mod recorder;
pub mod runner;
pub mod synth;

pub use config::{NodeIdentity, Remapping, TargetConfig};
pub use error::{RecorderError, Result};
pub use recorder::{Recorder, RecorderOptions, SessionArtifacts};
pub use runner::{CommandRunner, SystemRunner};

use std::path::Path;

/// Load a target configuration and run a full session against the host's
/// `ros2` tooling.
pub fn record_node_inputs(config_path: &Path, options: RecorderOptions) -> Result<SessionArtifacts> {
    let config = TargetConfig::load(config_path)?;
    log::info!(
        "Target node {} ({} / {})",
        config.identity(),
        config.package_name,
        config.executable
    );
    Recorder::new(SystemRunner, options).run(&config)
}

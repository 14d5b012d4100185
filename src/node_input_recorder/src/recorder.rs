//! End-to-end recording session
//!
//! Steps run strictly in sequence: discover subscriptions, create the
//! session directory, dump parameters, write the launch script and the
//! manifest, then record the bag. All paths are passed explicitly; the
//! process working directory is never changed.

use crate::{
    bag::RecordCommand,
    config::TargetConfig,
    error::{RecorderError, Result},
    introspect::{Introspector, SubscriptionInfo, DEFAULT_DISCOVERY_WAIT},
    manifest::{SessionManifest, MANIFEST_FILE},
    params::dump_parameters,
    runner::CommandRunner,
    synth::{params_file_name, session_dir_name, LaunchCommand, PARAMS_FILE_EXTENSION},
};
use chrono::NaiveDateTime;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_OUTPUT_ROOT: &str = "output";

#[derive(Debug, Clone)]
pub struct RecorderOptions {
    /// Parent of all session directories, created if missing.
    pub output_root: PathBuf,
    pub discovery_wait: Duration,
    /// Skip `ros2 bag record` when false.
    pub record_bag: bool,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            discovery_wait: DEFAULT_DISCOVERY_WAIT,
            record_bag: true,
        }
    }
}

/// Files produced by one session
#[derive(Debug, Clone)]
pub struct SessionArtifacts {
    pub session_dir: PathBuf,
    pub params_file: PathBuf,
    pub launch_script: PathBuf,
    pub manifest: PathBuf,
    pub bag: Option<PathBuf>,
    pub subscriptions: Vec<SubscriptionInfo>,
}

pub struct Recorder<R> {
    runner: R,
    options: RecorderOptions,
}

impl<R: CommandRunner> Recorder<R> {
    pub fn new(runner: R, options: RecorderOptions) -> Self {
        Self { runner, options }
    }

    pub fn options(&self) -> &RecorderOptions {
        &self.options
    }

    /// Run a session stamped with the current local time.
    pub fn run(&self, config: &TargetConfig) -> Result<SessionArtifacts> {
        self.run_at(config, chrono::Local::now().naive_local())
    }

    pub fn run_at(
        &self,
        config: &TargetConfig,
        started_at: NaiveDateTime,
    ) -> Result<SessionArtifacts> {
        config.validate()?;
        let identity = config.identity();
        let params_file = params_file_name(&config.namespace, &config.node_name)?;

        let subscriptions = Introspector::new(&self.runner, self.options.discovery_wait)
            .subscriptions(&identity)?;

        let session_dir = self.prepare_session_dir(&params_file, started_at)?;

        let params_path = session_dir.join(&params_file);
        dump_parameters(&self.runner, &identity, &params_path)?;

        let launch = LaunchCommand::new(
            &config.package_name,
            &config.executable,
            &params_file,
            &config.namespace,
            &config.node_name,
        )
        .remappings(&config.remappings);
        let launch_script = launch.write_script(&session_dir)?;

        let stem = params_file
            .strip_suffix(PARAMS_FILE_EXTENSION)
            .unwrap_or(&params_file);
        let record = RecordCommand::new(session_dir.join(format!("{}_bag", stem)))
            .topics(subscriptions.iter().map(|s| s.topic.clone()));
        let bag = self
            .options
            .record_bag
            .then(|| record.output().to_path_buf());

        let manifest = SessionManifest {
            node: config.node_name.clone(),
            namespace: config.namespace.clone(),
            package: config.package_name.clone(),
            executable: config.executable.clone(),
            started_at: started_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            params_file: params_file.clone(),
            launch_script: file_name(&launch_script),
            launch_command: launch.to_command_line(),
            remaps: SessionManifest::remaps_from(&config.remappings),
            subscriptions: subscriptions.clone(),
            recorded_topics: record.recorded_topics().to_vec(),
            bag: bag.as_ref().map(|p| file_name(p)),
        };
        manifest.write(&session_dir)?;

        if self.options.record_bag {
            record.run(&self.runner)?;
        } else {
            log::info!("Bag recording disabled, skipping: {}", record.invocation());
        }

        Ok(SessionArtifacts {
            manifest: session_dir.join(MANIFEST_FILE),
            session_dir,
            params_file: params_path,
            launch_script,
            bag,
            subscriptions,
        })
    }

    fn prepare_session_dir(&self, params_file: &str, started_at: NaiveDateTime) -> Result<PathBuf> {
        let root = &self.options.output_root;
        fs::create_dir_all(root)?;

        let session_dir = root.join(session_dir_name(params_file, started_at));
        match fs::create_dir(&session_dir) {
            Ok(()) => {
                log::info!("Session directory: {}", session_dir.display());
                Ok(session_dir)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(
                RecorderError::SessionExists(session_dir.display().to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RecorderOptions::default();
        assert_eq!(options.output_root, PathBuf::from("output"));
        assert_eq!(options.discovery_wait, Duration::from_secs(5));
        assert!(options.record_bag);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/a/b/ros2_run_pkg_exec")), "ros2_run_pkg_exec");
        assert_eq!(file_name(Path::new("/")), "");
    }
}

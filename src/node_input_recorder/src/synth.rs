//! Launch-command synthesis
//!
//! Produces the parameter file name for a node and the single command line
//! that re-runs its executable with those parameters, its original
//! namespace/name and the configured topic remappings.

use crate::{
    config::{relative_namespace, Remapping},
    error::{RecorderError, Result},
};
use chrono::NaiveDateTime;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

pub const PARAMS_FILE_EXTENSION: &str = ".yaml";

/// Timestamp prefix of session directories.
pub const SESSION_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Name of the parameter file dumped for a node.
///
/// Exactly one leading `/` is removed from the namespace, then every `/` in
/// `<namespace>/<node>.yaml` becomes `__`:
///
/// ```
/// use node_input_recorder::synth::params_file_name;
///
/// assert_eq!(params_file_name("/a/b", "c").unwrap(), "a__b__c.yaml");
/// assert_eq!(params_file_name("a/b", "c").unwrap(), "a__b__c.yaml");
/// ```
pub fn params_file_name(namespace: &str, node_name: &str) -> Result<String> {
    if namespace.is_empty() {
        return Err(RecorderError::EmptyNamespace {
            node: node_name.to_string(),
        });
    }

    let namespace = relative_namespace(namespace);
    let file_name = format!("{}/{}{}", namespace, node_name, PARAMS_FILE_EXTENSION);
    Ok(file_name.replace('/', "__"))
}

/// Name of the generated launch script.
pub fn launch_script_name(package: &str, executable: &str) -> String {
    format!("ros2_run_{}_{}", package, executable)
}

/// Name of the directory holding one session's artifacts.
pub fn session_dir_name(params_file: &str, timestamp: NaiveDateTime) -> String {
    let stem = params_file
        .strip_suffix(PARAMS_FILE_EXTENSION)
        .unwrap_or(params_file);
    format!("{}_{}", timestamp.format(SESSION_TIMESTAMP_FORMAT), stem)
}

/// `ros2 run` invocation that relaunches a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    package: String,
    executable: String,
    params_file: String,
    namespace: String,
    node_name: String,
    remappings: Vec<Remapping>,
}

impl LaunchCommand {
    pub fn new(
        package: impl Into<String>,
        executable: impl Into<String>,
        params_file: impl Into<String>,
        namespace: impl Into<String>,
        node_name: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            executable: executable.into(),
            params_file: params_file.into(),
            namespace: namespace.into(),
            node_name: node_name.into(),
            remappings: Vec::new(),
        }
    }

    pub fn remap(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.remappings.push(Remapping::new(from, to));
        self
    }

    /// Append remappings, preserving their order.
    pub fn remappings<'a>(mut self, remappings: impl IntoIterator<Item = &'a Remapping>) -> Self {
        self.remappings.extend(remappings.into_iter().cloned());
        self
    }

    pub fn tokens(&self) -> Vec<String> {
        let mut cmd = vec![
            "ros2".to_string(),
            "run".to_string(),
            self.package.clone(),
            self.executable.clone(),
        ];

        cmd.push("--ros-args".to_string());
        cmd.push("--params-file".to_string());
        cmd.push(self.params_file.clone());

        cmd.push("-r".to_string());
        cmd.push(format!("__ns:={}", self.namespace));
        cmd.push("-r".to_string());
        cmd.push(format!("__node:={}", self.node_name));

        for remap in &self.remappings {
            cmd.push("-r".to_string());
            cmd.push(format!("{}:={}", remap.from, remap.to));
        }

        cmd
    }

    /// Tokens joined into one shell line.
    pub fn to_command_line(&self) -> String {
        self.tokens()
            .iter()
            .map(|token| shell_quote(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write the command line into `dir` under the launch script name.
    pub fn write_script(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(launch_script_name(&self.package, &self.executable));
        fs::write(&path, format!("{}\n", self.to_command_line()))?;
        log::info!("Wrote launch script: {}", path.display());
        Ok(path)
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_line())
    }
}

/// Single-quote a token only when the shell would otherwise split or expand it.
pub fn shell_quote(token: &str) -> String {
    let is_plain = !token.is_empty()
        && token.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '/' | '_' | '-' | '.' | ':' | '=' | ',' | '@' | '+' | '%')
        });

    if is_plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

//! Target node configuration
//!
//! Two layouts are accepted:
//!
//! - a single YAML file holding `node_name`, `namespace`, `package_name`,
//!   `executable` and an optional `remappings` mapping;
//! - a directory holding `basic_info.yaml` (the four identity keys) and
//!   `remappings.yaml` (the mapping alone).

use crate::error::{RecorderError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{fmt, fs, path::Path};

pub const BASIC_INFO_FILE: &str = "basic_info.yaml";
pub const REMAPPINGS_FILE: &str = "remappings.yaml";

/// A node in the ROS graph, identified by namespace and name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub name: String,
    pub namespace: String,
}

impl NodeIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Absolute node name as accepted by `ros2 param` and `ros2 node`.
    pub fn fully_qualified_name(&self) -> String {
        let ns = relative_namespace(&self.namespace);
        if ns.is_empty() {
            format!("/{}", self.name)
        } else {
            format!("/{}/{}", ns, self.name)
        }
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name())
    }
}

/// Namespace with exactly one leading `/` removed.
pub fn relative_namespace(namespace: &str) -> &str {
    namespace.strip_prefix('/').unwrap_or(namespace)
}

/// A single topic remapping (`from:=to`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remapping {
    pub from: String,
    pub to: String,
}

impl Remapping {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Everything needed to dump, relaunch and record one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub node_name: String,
    pub namespace: String,
    pub package_name: String,
    pub executable: String,
    /// Kept in document order.
    pub remappings: Vec<Remapping>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    node_name: String,
    namespace: String,
    package_name: String,
    executable: String,
    #[serde(default)]
    remappings: Option<Mapping>,
}

impl TargetConfig {
    /// Load a configuration from a single file or a legacy directory.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.is_dir() {
            Self::load_dir(path)?
        } else {
            Self::load_file(path)?
        };
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        log::debug!("Loading target configuration: {}", path.display());
        let content = fs::read_to_string(path)?;
        let raw: RawTarget =
            serde_yaml::from_str(&content).map_err(|e| config_error(path, e))?;
        let remappings = match raw.remappings {
            Some(map) => remappings_from_mapping(path, &map)?,
            None => Vec::new(),
        };

        Ok(Self {
            node_name: raw.node_name,
            namespace: raw.namespace,
            package_name: raw.package_name,
            executable: raw.executable,
            remappings,
        })
    }

    fn load_dir(dir: &Path) -> Result<Self> {
        let basic_info = dir.join(BASIC_INFO_FILE);
        log::debug!("Loading target configuration: {}", basic_info.display());
        let content = fs::read_to_string(&basic_info)?;
        let raw: RawTarget =
            serde_yaml::from_str(&content).map_err(|e| config_error(&basic_info, e))?;
        if raw.remappings.is_some() {
            log::warn!(
                "Ignoring 'remappings' in {}; {} is used instead",
                basic_info.display(),
                REMAPPINGS_FILE
            );
        }

        let remappings_path = dir.join(REMAPPINGS_FILE);
        let remappings = if remappings_path.is_file() {
            load_remappings(&remappings_path)?
        } else {
            log::warn!(
                "{} not found, relaunching without remappings",
                remappings_path.display()
            );
            Vec::new()
        };

        Ok(Self {
            node_name: raw.node_name,
            namespace: raw.namespace,
            package_name: raw.package_name,
            executable: raw.executable,
            remappings,
        })
    }

    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::new(&self.node_name, &self.namespace)
    }

    /// Reject values that would produce a broken dump or launch command.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(RecorderError::EmptyNamespace {
                node: self.node_name.clone(),
            });
        }
        if self.namespace != "/"
            && (self.namespace.ends_with('/') || self.namespace.contains("//"))
        {
            return Err(RecorderError::InvalidConfig(format!(
                "Namespace '{}' has an empty segment",
                self.namespace
            )));
        }

        for (key, value) in [
            ("node_name", &self.node_name),
            ("package_name", &self.package_name),
            ("executable", &self.executable),
        ] {
            if value.trim().is_empty() {
                return Err(RecorderError::InvalidConfig(format!(
                    "'{}' must not be empty",
                    key
                )));
            }
        }

        for remap in &self.remappings {
            if remap.from.is_empty() || remap.to.is_empty() {
                return Err(RecorderError::InvalidConfig(format!(
                    "Remapping '{}:={}' has an empty side",
                    remap.from, remap.to
                )));
            }
        }

        Ok(())
    }
}

/// Load a standalone remapping table.
pub fn load_remappings(path: &Path) -> Result<Vec<Remapping>> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let map: Option<Mapping> =
        serde_yaml::from_str(&content).map_err(|e| config_error(path, e))?;
    match map {
        Some(map) => remappings_from_mapping(path, &map),
        None => Ok(Vec::new()),
    }
}

fn remappings_from_mapping(path: &Path, map: &Mapping) -> Result<Vec<Remapping>> {
    map.iter()
        .map(|(from, to)| {
            let from = scalar_to_string(from)
                .ok_or_else(|| config_error(path, format!("invalid remapping key {:?}", from)))?;
            let to = scalar_to_string(to).ok_or_else(|| {
                config_error(path, format!("invalid remapping target for '{}'", from))
            })?;
            Ok(Remapping::new(from, to))
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn config_error(path: &Path, message: impl fmt::Display) -> RecorderError {
    RecorderError::config(path.display().to_string(), message)
}

//! session.json data structures

use crate::{config::Remapping, introspect::SubscriptionInfo};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const MANIFEST_FILE: &str = "session.json";

/// Summary of one recording session, written next to its artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionManifest {
    pub node: String,
    pub namespace: String,
    pub package: String,
    pub executable: String,
    pub started_at: String,
    pub params_file: String,
    pub launch_script: String,
    pub launch_command: String,
    pub remaps: Vec<(String, String)>,
    pub subscriptions: Vec<SubscriptionInfo>,
    pub recorded_topics: Vec<String>,
    pub bag: Option<String>,
}

impl SessionManifest {
    pub fn remaps_from(remappings: &[Remapping]) -> Vec<(String, String)> {
        remappings
            .iter()
            .map(|r| (r.from.clone(), r.to.clone()))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write(&self, dir: &Path) -> crate::error::Result<()> {
        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, self.to_json()?)?;
        log::debug!("Wrote session manifest: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> SessionManifest {
        SessionManifest {
            node: "controller".to_string(),
            namespace: "/robot".to_string(),
            package: "pkg".to_string(),
            executable: "exec".to_string(),
            started_at: "2024-03-09T07:05:01".to_string(),
            params_file: "robot__controller.yaml".to_string(),
            launch_script: "ros2_run_pkg_exec".to_string(),
            launch_command: "ros2 run pkg exec --ros-args".to_string(),
            remaps: vec![("odom".to_string(), "/robot/odom".to_string())],
            subscriptions: vec![SubscriptionInfo {
                topic: "/robot/scan".to_string(),
                types: vec!["sensor_msgs/msg/LaserScan".to_string()],
            }],
            recorded_topics: vec![
                "/tf".to_string(),
                "/tf_static".to_string(),
                "/robot/scan".to_string(),
            ],
            bag: None,
        }
    }

    #[test]
    fn test_serialize_manifest() {
        let json = manifest().to_json().unwrap();
        assert!(json.contains("\"node\": \"controller\""));
        assert!(json.contains("\"bag\": null"));
        assert!(json.contains("sensor_msgs/msg/LaserScan"));
    }

    #[test]
    fn test_remaps_keep_table_order() {
        let remaps = SessionManifest::remaps_from(&[
            Remapping::new("scan", "/robot/scan"),
            Remapping::new("odom", "/robot/odom"),
        ]);
        let json = serde_json::to_string(&SessionManifest {
            remaps,
            ..manifest()
        })
        .unwrap();
        assert!(json.contains(
            "\"remaps\":[[\"scan\",\"/robot/scan\"],[\"odom\",\"/robot/odom\"]]"
        ));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::TempDir::new().unwrap();
        manifest().write(dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let parsed: SessionManifest = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, manifest());
    }
}

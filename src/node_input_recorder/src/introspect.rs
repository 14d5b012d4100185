//! Subscription discovery through `ros2 node info`

use crate::{
    config::NodeIdentity,
    error::{RecorderError, Result},
    runner::{CommandRunner, Invocation},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default delay before querying the graph.
pub const DEFAULT_DISCOVERY_WAIT: Duration = Duration::from_secs(5);

const SUBSCRIBERS_SECTION: &str = "Subscribers";

/// A topic the node subscribes to, with its advertised types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub topic: String,
    pub types: Vec<String>,
}

/// Extract the `Subscribers:` section from `ros2 node info` output.
///
/// ```text
/// /robot/controller
///   Subscribers:
///     /scan: sensor_msgs/msg/LaserScan
///   Publishers:
///     ...
/// ```
pub fn parse_node_info(node: &NodeIdentity, output: &str) -> Result<Vec<SubscriptionInfo>> {
    let mut in_section = false;
    let mut found = false;
    let mut subscriptions = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        if indent <= 2 {
            // Node name or section header
            in_section = trimmed.strip_suffix(':') == Some(SUBSCRIBERS_SECTION);
            found |= in_section;
            continue;
        }

        if !in_section {
            continue;
        }

        match trimmed.split_once(':') {
            Some((topic, types)) => subscriptions.push(SubscriptionInfo {
                topic: topic.trim().to_string(),
                types: types
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect(),
            }),
            None => log::warn!("Skipping unrecognized subscriber line: {}", trimmed),
        }
    }

    if !found {
        return Err(RecorderError::NodeNotFound(node.fully_qualified_name()));
    }
    Ok(subscriptions)
}

/// `ros2 node info` invocation for a node.
///
/// Hidden topics (any name token starting with `_`, e.g. action feedback and
/// status) are inputs too, so they are always listed.
pub fn node_info_invocation(node: &NodeIdentity) -> Invocation {
    Invocation::new("ros2")
        .args(["node", "info", "--include-hidden"])
        .arg(node.fully_qualified_name())
}

/// Queries the live graph for a node's subscriptions
#[derive(Debug)]
pub struct Introspector<R> {
    runner: R,
    discovery_wait: Duration,
}

impl<R: CommandRunner> Introspector<R> {
    pub fn new(runner: R, discovery_wait: Duration) -> Self {
        Self {
            runner,
            discovery_wait,
        }
    }

    /// Wait for discovery to settle, then list the node's subscriptions.
    pub fn subscriptions(&self, node: &NodeIdentity) -> Result<Vec<SubscriptionInfo>> {
        if !self.discovery_wait.is_zero() {
            log::info!(
                "Waiting {:.1}s for discovery before querying {}",
                self.discovery_wait.as_secs_f64(),
                node
            );
            std::thread::sleep(self.discovery_wait);
        }

        let output = match self.runner.output(&node_info_invocation(node)) {
            Ok(output) => output,
            Err(RecorderError::CommandFailed { ref stderr, .. })
                if stderr.contains("Unable to find node") =>
            {
                return Err(RecorderError::NodeNotFound(node.fully_qualified_name()));
            }
            Err(e) => return Err(e),
        };

        let subscriptions = parse_node_info(node, &output.stdout)?;
        log::info!("{} subscribes to {} topic(s)", node, subscriptions.len());
        for sub in &subscriptions {
            log::debug!("  {} [{}]", sub.topic, sub.types.join(", "));
        }
        Ok(subscriptions)
    }
}

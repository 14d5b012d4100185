//! Bag recording of a node's input topics

use crate::{
    error::Result,
    runner::{CommandRunner, Invocation},
};
use std::path::{Path, PathBuf};

/// Transform topics recorded alongside every node's inputs.
pub const TRANSFORM_TOPICS: [&str; 2] = ["/tf", "/tf_static"];

/// `ros2 bag record` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCommand {
    output: PathBuf,
    topics: Vec<String>,
}

impl RecordCommand {
    /// Start with the transform topics; `output` must not exist yet.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            topics: TRANSFORM_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Add topics, skipping any already present.
    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for topic in topics {
            let topic = topic.into();
            if self.topics.contains(&topic) {
                log::debug!("Topic {} already recorded", topic);
            } else {
                self.topics.push(topic);
            }
        }
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn recorded_topics(&self) -> &[String] {
        &self.topics
    }

    pub fn invocation(&self) -> Invocation {
        Invocation::new("ros2")
            .args(["bag", "record", "-o"])
            .arg(self.output.display().to_string())
            .args(self.topics.iter().cloned())
    }

    /// Record until the child exits (normally on Ctrl-C).
    pub fn run<R: CommandRunner>(&self, runner: &R) -> Result<()> {
        log::info!(
            "Recording {} topic(s) into {} (press Ctrl-C to stop)",
            self.topics.len(),
            self.output.display()
        );
        runner.interactive(&self.invocation())?;
        log::info!("Recording finished: {}", self.output.display());
        Ok(())
    }
}

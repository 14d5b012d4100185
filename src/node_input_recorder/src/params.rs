//! Parameter dump and post-processing

use crate::{
    config::NodeIdentity,
    error::Result,
    runner::{CommandRunner, Invocation},
};
use std::{fs, path::Path};

/// Value marker that cannot be replayed through `--params-file`.
pub const EMPTY_LIST_MARKER: &str = ": []";

/// Comment out every line holding an empty-list value.
///
/// Lines containing `: []` get a leading `#`. All other lines, including
/// their terminators, are returned unchanged.
pub fn comment_out_empty_lists(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        if line.contains(EMPTY_LIST_MARKER) {
            output.push('#');
        }
        output.push_str(line);
    }
    output
}

/// `ros2 param dump` invocation for a node.
pub fn dump_invocation(identity: &NodeIdentity) -> Invocation {
    Invocation::new("ros2")
        .args(["param", "dump"])
        .arg(identity.fully_qualified_name())
}

/// Dump a node's parameters into `dest`, commenting out empty lists.
///
/// Returns the number of lines that were commented out.
pub fn dump_parameters<R: CommandRunner>(
    runner: &R,
    identity: &NodeIdentity,
    dest: &Path,
) -> Result<usize> {
    log::info!("Dumping parameters of {}", identity);
    let output = runner.output(&dump_invocation(identity))?;

    let commented = output
        .stdout
        .lines()
        .filter(|line| line.contains(EMPTY_LIST_MARKER))
        .count();
    if commented > 0 {
        log::warn!(
            "Commented out {} empty-list parameter(s) in {}",
            commented,
            dest.display()
        );
    }

    fs::write(dest, comment_out_empty_lists(&output.stdout))?;
    log::info!("Wrote parameter file: {}", dest.display());
    Ok(commented)
}

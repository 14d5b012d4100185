//! Subprocess invocation
//!
//! Every middleware interaction goes through [`CommandRunner`] so that exit
//! status and stderr are always checked, and so tests can substitute a fake.

use crate::error::{RecorderError, Result};
use std::{
    fmt,
    process::{Command, Stdio},
};

/// A program and its argv, run without a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandRunner {
    /// Run to completion with captured stdout/stderr.
    fn output(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run attached to the terminal until the child exits.
    fn interactive(&self, invocation: &Invocation) -> Result<()>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).output(invocation)
    }

    fn interactive(&self, invocation: &Invocation) -> Result<()> {
        (**self).interactive(invocation)
    }
}

/// Runs commands on the host with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        command
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        log::debug!("Running: {}", invocation);

        let output = Self::command(invocation)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RecorderError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(RecorderError::CommandFailed {
                command: invocation.to_string(),
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            log::debug!("{} stderr: {}", invocation.program, stderr.trim());
        }

        let stdout =
            String::from_utf8(output.stdout).map_err(|_| RecorderError::NonUtf8Output {
                command: invocation.to_string(),
            })?;

        Ok(CommandOutput { stdout, stderr })
    }

    fn interactive(&self, invocation: &Invocation) -> Result<()> {
        log::debug!("Running interactively: {}", invocation);

        // Ctrl-C reaches the whole foreground group; only the child should stop.
        #[cfg(unix)]
        let _guard = interrupt::InterruptGuard::new();

        let status = Self::command(invocation)
            .status()
            .map_err(|source| RecorderError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        if status.success() || stopped_by_interrupt(&status) {
            Ok(())
        } else {
            Err(RecorderError::CommandFailed {
                command: invocation.to_string(),
                status,
                stderr: String::new(),
            })
        }
    }
}

#[cfg(unix)]
fn stopped_by_interrupt(status: &std::process::ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(signal_hook::consts::SIGINT)
}

#[cfg(not(unix))]
fn stopped_by_interrupt(_status: &std::process::ExitStatus) -> bool {
    false
}

#[cfg(unix)]
mod interrupt {
    use signal_hook::{consts::SIGINT, flag};
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, OnceLock,
    };

    struct State {
        /// SIGINT terminates the process only while this is set.
        default_action: Arc<AtomicBool>,
        children: Mutex<usize>,
    }

    static STATE: OnceLock<Option<State>> = OnceLock::new();

    fn state() -> Option<&'static State> {
        STATE
            .get_or_init(|| {
                let default_action = Arc::new(AtomicBool::new(true));
                match flag::register_conditional_default(SIGINT, Arc::clone(&default_action)) {
                    Ok(_) => Some(State {
                        default_action,
                        children: Mutex::new(0),
                    }),
                    Err(e) => {
                        log::warn!("Failed to install SIGINT handler: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Suppresses SIGINT termination while at least one guard is alive.
    pub(super) struct InterruptGuard {
        state: Option<&'static State>,
    }

    impl InterruptGuard {
        pub(super) fn new() -> Self {
            let state = state();
            if let Some(state) = state {
                let mut children = state.children.lock().unwrap_or_else(|e| e.into_inner());
                *children += 1;
                state.default_action.store(false, Ordering::SeqCst);
            }
            Self { state }
        }
    }

    impl Drop for InterruptGuard {
        fn drop(&mut self) {
            if let Some(state) = self.state {
                let mut children = state.children.lock().unwrap_or_else(|e| e.into_inner());
                *children = children.saturating_sub(1);
                if *children == 0 {
                    state.default_action.store(true, Ordering::SeqCst);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("ros2")
            .arg("param")
            .args(["dump", "/robot/controller"]);
        assert_eq!(inv.to_string(), "ros2 param dump /robot/controller");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let inv = Invocation::new("node-input-recorder-no-such-program");
        let err = SystemRunner.output(&inv).unwrap_err();
        assert!(matches!(err, RecorderError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        let inv = Invocation::new("sh").args(["-c", "printf 'a: 1\\n'"]);
        let output = SystemRunner.output(&inv).unwrap();
        assert_eq!(output.stdout, "a: 1\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_command_failed() {
        let inv = Invocation::new("sh").args(["-c", "echo boom >&2; exit 3"]);
        let err = SystemRunner.output(&inv).unwrap_err();
        match err {
            RecorderError::CommandFailed { stderr, status, .. } => {
                assert_eq!(stderr, "boom");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_stdout() {
        let inv = Invocation::new("sh").args(["-c", "printf '\\377'"]);
        let err = SystemRunner.output(&inv).unwrap_err();
        assert!(matches!(err, RecorderError::NonUtf8Output { .. }), "{}", err);
    }

    #[cfg(unix)]
    #[test]
    fn test_interactive_survives_interrupt() {
        // Ctrl-C delivered to this process while the child runs
        let inv = Invocation::new("sh").args(["-c", "kill -INT $PPID; sleep 0.3; exit 0"]);
        assert!(SystemRunner.interactive(&inv).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_interactive_child_stopped_by_interrupt() {
        let inv = Invocation::new("sh").args(["-c", "kill -INT $PPID; sleep 0.3; kill -INT $$"]);
        assert!(SystemRunner.interactive(&inv).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_interactive_status() {
        assert!(SystemRunner.interactive(&Invocation::new("true")).is_ok());
        let err = SystemRunner
            .interactive(&Invocation::new("false"))
            .unwrap_err();
        assert!(matches!(err, RecorderError::CommandFailed { .. }));
    }
}

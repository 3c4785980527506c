use super::error::BuildError;
use super::job::Invocation;
use std::process::Command;

/// Result of running one compiler or linker process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stderr: stderr.into(),
            ..Default::default()
        }
    }
}

/// Runs toolchain invocations. Called from several compile workers at
/// once.
pub trait Executor: Sync {
    /// Runs `invocation` to completion. `Err` means the program could not
    /// be started; a non-zero exit is reported through [`Outcome`].
    fn run(&self, invocation: &Invocation) -> Result<Outcome, BuildError>;
}

/// Spawns real processes and waits for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn run(&self, invocation: &Invocation) -> Result<Outcome, BuildError> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|source| BuildError::Launch {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(Outcome {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

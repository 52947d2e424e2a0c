//! Lifecycle of a locally launched SUT process.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::config::SulConfig;
use crate::sul::SulError;

/// Launches, probes, and terminates the SUT process.
#[derive(Debug)]
pub struct ProcessHandler {
    command: Vec<String>,
    terminate_command: Option<Vec<String>>,
    process_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    start_wait: Duration,
    child: Option<Child>,
    launches: u64,
}

impl ProcessHandler {
    pub fn new(command: &str, start_wait: Duration) -> Self {
        Self {
            command: split_command(command),
            terminate_command: None,
            process_dir: None,
            output_dir: None,
            start_wait,
            child: None,
            launches: 0,
        }
    }

    /// Build a handler from the process fields of `config`. None if no command is set.
    pub fn from_config(config: &SulConfig) -> Option<Self> {
        let command = config.command.as_deref()?;
        let mut handler = Self::new(command, config.start_wait());
        handler.terminate_command = config.terminate_command.as_deref().map(split_command);
        handler.process_dir = config.process_dir.clone();
        handler.output_dir = config.redirect_output_dir.clone();
        Some(handler)
    }

    /// Start the process unless it is already running, then wait the start delay.
    pub fn launch(&mut self) -> Result<(), SulError> {
        if self.is_alive() {
            return Ok(());
        }
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| SulError::Process("empty launch command".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());
        if let Some(dir) = &self.process_dir {
            cmd.current_dir(dir);
        }
        match &self.output_dir {
            Some(dir) => {
                cmd.stdout(append_to(&dir.join("sut.out"))?)
                    .stderr(append_to(&dir.join("sut.err"))?);
            }
            None => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        let child = cmd
            .spawn()
            .map_err(|e| SulError::Process(format!("failed to launch '{program}': {e}")))?;
        tracing::info!(command = %self.command.join(" "), pid = child.id(), "launched SUT process");
        self.child = Some(child);
        self.launches += 1;

        if !self.start_wait.is_zero() {
            std::thread::sleep(self.start_wait);
        }
        Ok(())
    }

    /// Stop the process if it is running. Safe to call repeatedly.
    pub fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Some(terminate) = &self.terminate_command {
            run_to_completion(terminate, self.process_dir.as_deref());
        }
        if matches!(child.try_wait(), Ok(None)) {
            if let Err(e) = child.kill() {
                tracing::warn!(pid = child.id(), error = %e, "failed to kill SUT process");
            }
        }
        match child.wait() {
            Ok(status) => tracing::debug!(pid = child.id(), %status, "SUT process exited"),
            Err(e) => tracing::warn!(pid = child.id(), error = %e, "failed to reap SUT process"),
        }
    }

    pub fn is_alive(&mut self) -> bool {
        match &mut self.child {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    pub fn has_launched(&self) -> bool {
        self.launches > 0
    }

    /// Number of times the process was started.
    pub fn launches(&self) -> u64 {
        self.launches
    }
}

impl Drop for ProcessHandler {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

fn append_to(path: &Path) -> Result<File, SulError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SulError::Process(format!("cannot open {}: {e}", path.display())))
}

fn run_to_completion(command: &[String], dir: Option<&Path>) {
    let Some((program, args)) = command.split_first() else {
        return;
    };
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    match cmd.status() {
        Ok(status) if !status.success() => {
            tracing::warn!(command = %command.join(" "), %status, "terminate command failed")
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(command = %command.join(" "), error = %e, "cannot run terminate command"),
    }
}

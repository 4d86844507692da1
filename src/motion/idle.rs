//! Idle-sleep inhibition held for as long as sensing is active.

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};

/// Platform hook that keeps the machine from idling to sleep
pub trait SleepInhibitor: Send + Sync {
    /// Start inhibiting idle sleep
    fn inhibit(&self) -> Result<(), String>;

    /// Stop inhibiting idle sleep. Must be safe to call when not inhibiting.
    fn release(&self);
}

/// Scoped idle-sleep inhibition; released when dropped
pub struct IdleSleepGuard {
    inhibitor: Arc<dyn SleepInhibitor>,
}

impl IdleSleepGuard {
    /// Acquire the inhibitor. Failure to inhibit is logged, not fatal.
    pub fn acquire(inhibitor: Arc<dyn SleepInhibitor>) -> Self {
        if let Err(e) = inhibitor.inhibit() {
            log::warn!("Could not inhibit idle sleep: {}", e);
        }
        Self { inhibitor }
    }
}

impl Drop for IdleSleepGuard {
    fn drop(&mut self) {
        self.inhibitor.release();
    }
}

/// Inhibits idle sleep by keeping a platform helper process alive
/// (`systemd-inhibit` on Linux, `caffeinate` on macOS)
#[derive(Default)]
pub struct CommandInhibitor {
    child: Mutex<Option<Child>>,
}

impl CommandInhibitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn command() -> Option<Command> {
        if cfg!(target_os = "linux") {
            let mut cmd = Command::new("systemd-inhibit");
            cmd.args([
                "--what=idle:sleep",
                "--who=bikebell",
                "--why=Shake detection active",
                "sleep",
                "infinity",
            ]);
            Some(cmd)
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("caffeinate");
            cmd.args(["-d", "-i"]);
            Some(cmd)
        } else {
            None
        }
    }
}

impl SleepInhibitor for CommandInhibitor {
    fn inhibit(&self) -> Result<(), String> {
        let mut child = self.child.lock().map_err(|e| e.to_string())?;
        if child.is_some() {
            return Ok(());
        }

        let Some(mut cmd) = Self::command() else {
            log::debug!("No idle-sleep inhibitor for this platform");
            return Ok(());
        };

        let program = cmd.get_program().to_string_lossy().into_owned();
        let spawned = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("{}: {}", program, e))?;
        log::info!("Idle sleep inhibited (pid {})", spawned.id());
        *child = Some(spawned);
        Ok(())
    }

    fn release(&self) {
        let Ok(mut child) = self.child.lock() else {
            return;
        };
        if let Some(mut process) = child.take() {
            let _ = process.kill();
            let _ = process.wait();
            log::info!("Idle sleep allowed again");
        }
    }
}

impl Drop for CommandInhibitor {
    fn drop(&mut self) {
        self.release();
    }
}

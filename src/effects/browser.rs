//! Detached browser session launcher.
//!
//! Sessions run in kiosk mode with an isolated `--user-data-dir` per
//! service. That directory path is also the kill pattern: closing a session
//! is `pkill -f <profile dir>`, unconditional and best-effort. No
//! in-process open/closed state is tracked.

use crate::command::Service;
use crate::config::Config;
use crate::effects::SessionLauncher;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Launches browser windows as detached child processes.
pub struct BrowserLauncher {
    command: String,
    profile_base: PathBuf,
}

impl BrowserLauncher {
    pub fn new(config: &Config) -> Self {
        BrowserLauncher {
            command: config.browser.clone(),
            profile_base: config.profile_base.clone(),
        }
    }

    /// Profile directory for a service, under the configured base.
    fn profile_path(&self, service: Service) -> PathBuf {
        self.profile_base.join(service.profile_dir())
    }
}

impl SessionLauncher for BrowserLauncher {
    fn open(&self, service: Service) {
        let profile = self.profile_path(service);

        let spawned = Command::new(&self.command)
            .arg(format!("--user-data-dir={}", profile.display()))
            .arg(format!("--app={}", service.url()))
            .arg("--kiosk")
            .arg("--disable-gpu")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                // Not waited on; the session outlives the command loop's interest
                debug!(service = service.label(), pid = child.id(), "Session launched");
            }
            Err(e) => {
                warn!(service = service.label(), error = %e, "Failed to launch session");
            }
        }
    }

    fn close(&self, service: Service) {
        let pattern = self.profile_path(service);

        let spawned = Command::new("pkill")
            .arg("-f")
            .arg(pattern.as_os_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_) => debug!(service = service.label(), "Session close requested"),
            Err(e) => {
                warn!(service = service.label(), error = %e, "Failed to run pkill");
            }
        }
    }
}

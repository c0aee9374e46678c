//! Media-key volume control via xdotool.

use crate::effects::MediaKeys;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

const RAISE_KEY: &str = "XF86AudioRaiseVolume";
const LOWER_KEY: &str = "XF86AudioLowerVolume";

/// Sends media-key events by spawning `xdotool key <keysym>`.
pub struct XdotoolKeys {
    command: String,
}

impl Default for XdotoolKeys {
    fn default() -> Self {
        XdotoolKeys {
            command: "xdotool".to_string(),
        }
    }
}

impl XdotoolKeys {
    fn press(&self, keysym: &str) {
        let spawned = Command::new(&self.command)
            .arg("key")
            .arg(keysym)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_) => debug!(keysym, "Media key pressed"),
            Err(e) => warn!(keysym, error = %e, "Failed to run xdotool"),
        }
    }
}

impl MediaKeys for XdotoolKeys {
    fn raise_volume(&self) {
        self.press(RAISE_KEY);
    }

    fn lower_volume(&self) {
        self.press(LOWER_KEY);
    }
}

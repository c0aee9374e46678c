//! Side-effect collaborators invoked by the command loop.
//!
//! Every effect is fire-and-forget: the loop never waits on completion and
//! failures are logged locally without changing the reply sent to the peer.
//! The traits exist so tests can substitute recording fakes.

pub mod browser;
pub mod media;

pub use browser::BrowserLauncher;
pub use media::XdotoolKeys;

use crate::command::Service;

/// Opens and closes isolated browser sessions for a service.
pub trait SessionLauncher: Send + Sync {
    /// Launch a detached browser window for the service. Fire-and-forget.
    fn open(&self, service: Service);

    /// Best-effort terminate any running session for the service.
    /// Idempotent; a no-op when nothing matches.
    fn close(&self, service: Service);
}

/// Adjusts system volume via media keys.
pub trait MediaKeys: Send + Sync {
    /// Raise volume one step. Fire-and-forget.
    fn raise_volume(&self);

    /// Lower volume one step. Fire-and-forget.
    fn lower_volume(&self);
}

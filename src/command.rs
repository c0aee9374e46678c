//! Remote-control command vocabulary and classification.
//!
//! Inbound messages are normalized (line endings stripped, ASCII-lowercased)
//! and matched exactly against a fixed command table. There is no argument
//! parsing; anything outside the vocabulary classifies as `Unknown`.

/// Generic acknowledgement sent for every processed message.
pub const ACK: &str = "Command received.\n";

/// Extra line sent before the ack when a YouTube session opens.
///
/// The advertised `play <song name>` command is not part of the vocabulary;
/// the hint is kept as-is for client compatibility.
pub const YOUTUBE_HINT: &str =
    "YouTube opened. You can now search songs using: play <song name>\n";

/// A browser session target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Facebook,
    Youtube,
    Github,
}

impl Service {
    /// Human-readable label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Service::Facebook => "facebook",
            Service::Youtube => "youtube",
            Service::Github => "github",
        }
    }

    /// URL the browser session opens.
    pub fn url(&self) -> &'static str {
        match self {
            Service::Facebook => "https://facebook.com",
            Service::Youtube => "https://youtube.com",
            Service::Github => "https://github.com",
        }
    }

    /// Name of the isolated profile directory for this session.
    ///
    /// Doubles as the pattern used to find and kill the session's processes,
    /// so it must be unique per service.
    pub fn profile_dir(&self) -> &'static str {
        match self {
            Service::Facebook => "fb_session",
            Service::Youtube => "youtube_session",
            Service::Github => "github_session",
        }
    }
}

/// A classified client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Launch a browser session for the service.
    Open(Service),
    /// Kill any running session for the service.
    Close(Service),
    /// Raise system volume one step.
    VolumeUp,
    /// Lower system volume one step.
    VolumeDown,
    /// End the session loop.
    Exit,
    /// Anything outside the vocabulary. No side effect.
    Unknown,
}

impl Command {
    /// Informational line sent before the generic ack, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Command::Open(Service::Youtube) => Some(YOUTUBE_HINT),
            _ => None,
        }
    }
}

/// The fixed vocabulary. Adding a command is a data change here plus a
/// dispatch arm in the server loop.
const VOCABULARY: &[(&str, Command)] = &[
    ("open facebook", Command::Open(Service::Facebook)),
    ("close facebook", Command::Close(Service::Facebook)),
    ("open youtube", Command::Open(Service::Youtube)),
    ("close youtube", Command::Close(Service::Youtube)),
    ("open github", Command::Open(Service::Github)),
    ("close github", Command::Close(Service::Github)),
    ("vol+", Command::VolumeUp),
    ("vol-", Command::VolumeDown),
    ("exit", Command::Exit),
];

/// Clean a raw message: drop every `\n` and `\r` (anywhere, not just
/// trailing) and fold ASCII upper case to lower. Non-ASCII bytes pass
/// through untouched.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c != '\n' && c != '\r')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Classify a normalized message by exact match against the vocabulary.
pub fn classify(message: &str) -> Command {
    VOCABULARY
        .iter()
        .find(|(text, _)| *text == message)
        .map(|&(_, command)| command)
        .unwrap_or(Command::Unknown)
}

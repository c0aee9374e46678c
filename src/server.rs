//! Command loop: turn received text into a side effect and a reply.
//!
//! One session, fully serialized: receive, normalize, classify, dispatch
//! the effect, then send the reply. The loop ends on the `exit` command,
//! peer disconnect, or a transport failure. Effect dispatch never blocks
//! the loop and never changes the reply.

use crate::command::{self, Command};
use crate::config::Config;
use crate::effects::{BrowserLauncher, MediaKeys, SessionLauncher, XdotoolKeys};
use crate::endpoint::{Endpoint, ReceiveOutcome, Session, SocketError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Server instance holding the side-effect collaborators.
pub struct Server {
    launcher: Arc<dyn SessionLauncher>,
    media: Arc<dyn MediaKeys>,
}

impl Server {
    /// Create a server wired to the real browser and media-key effects.
    pub fn new(config: &Config) -> Self {
        Server {
            launcher: Arc::new(BrowserLauncher::new(config)),
            media: Arc::new(XdotoolKeys::default()),
        }
    }

    /// Create a server with injected effect implementations.
    pub fn with_effects(launcher: Arc<dyn SessionLauncher>, media: Arc<dyn MediaKeys>) -> Self {
        Server { launcher, media }
    }

    /// Accept the single client and run the command loop to completion.
    ///
    /// Returns an error only for accept failure; once a session exists, all
    /// outcomes (exit command, peer close, transport error) end cleanly.
    pub async fn run(&self, endpoint: Endpoint) -> Result<(), SocketError> {
        let mut session = endpoint.accept_once().await?;
        info!(peer = %session.peer_addr(), "Client connected");

        self.serve(&mut session).await;

        info!("Session ended");
        Ok(())
    }

    /// One iteration per received message: effect first, then reply.
    async fn serve(&self, session: &mut Session) {
        loop {
            let raw = match session.receive().await {
                ReceiveOutcome::Data(text) => text,
                ReceiveOutcome::Closed => {
                    info!("Peer closed the stream");
                    return;
                }
                ReceiveOutcome::Failed(e) => {
                    warn!(error = %e, "Receive failed");
                    return;
                }
            };

            let message = command::normalize(&raw);
            let cmd = command::classify(&message);
            debug!(message = %message, command = ?cmd, "Client message");

            self.dispatch(cmd, &message);

            if let Some(hint) = cmd.hint() {
                if let Err(e) = session.send(hint).await {
                    warn!(error = %e, "Send failed");
                    return;
                }
            }

            if let Err(e) = session.send(command::ACK).await {
                warn!(error = %e, "Send failed");
                return;
            }

            if cmd == Command::Exit {
                info!("Exit command received, shutting down");
                return;
            }
        }
    }

    /// Invoke the side effect for a classified command.
    fn dispatch(&self, cmd: Command, message: &str) {
        match cmd {
            Command::Open(service) => {
                info!(service = service.label(), "Opening session");
                self.launcher.open(service);
            }
            Command::Close(service) => {
                info!(service = service.label(), "Closing session");
                self.launcher.close(service);
            }
            Command::VolumeUp => {
                info!("Increasing volume");
                self.media.raise_volume();
            }
            Command::VolumeDown => {
                info!("Decreasing volume");
                self.media.lower_volume();
            }
            Command::Exit => {}
            Command::Unknown => {
                info!(message = %message, "Unknown command");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Service, ACK, YOUTUBE_HINT};
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    /// Records every effect invocation in order.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SessionLauncher for Recorder {
        fn open(&self, service: Service) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("open {}", service.label()));
        }

        fn close(&self, service: Service) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("close {}", service.label()));
        }
    }

    impl MediaKeys for Recorder {
        fn raise_volume(&self) {
            self.calls.lock().unwrap().push("vol+".to_string());
        }

        fn lower_volume(&self) {
            self.calls.lock().unwrap().push("vol-".to_string());
        }
    }

    fn test_config() -> Config {
        Config {
            bind: "127.0.0.1".to_string(),
            port: 0,
            browser: "google-chrome".to_string(),
            profile_base: "/tmp".into(),
            log_level: "info".to_string(),
        }
    }

    /// Bind on an ephemeral port and run the server with recording effects.
    fn start(recorder: Arc<Recorder>) -> (SocketAddr, JoinHandle<Result<(), SocketError>>) {
        let endpoint = Endpoint::bind(&test_config()).unwrap();
        let addr = endpoint.local_addr().unwrap();
        let server = Server::with_effects(recorder.clone(), recorder);
        let handle = tokio::spawn(async move { server.run(endpoint).await });
        (addr, handle)
    }

    async fn read_line(reader: &mut BufReader<TcpStream>) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        line
    }

    #[tokio::test]
    async fn test_round_trip_open_close_exit() {
        let recorder = Arc::new(Recorder::default());
        let (addr, handle) = start(recorder.clone());

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = BufReader::new(stream);

        client.get_mut().write_all(b"OPEN GITHUB\n").await.unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        client.get_mut().write_all(b"close github").await.unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        client.get_mut().write_all(b"exit").await.unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        // Server closes the session after exit
        let mut rest = Vec::new();
        let n = client.get_mut().read_to_end(&mut rest).await.unwrap();
        assert_eq!(n, 0);

        handle.await.unwrap().unwrap();
        assert_eq!(recorder.calls(), vec!["open github", "close github"]);
    }

    #[tokio::test]
    async fn test_open_youtube_sends_hint_before_ack() {
        let recorder = Arc::new(Recorder::default());
        let (addr, handle) = start(recorder.clone());

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = BufReader::new(stream);

        client
            .get_mut()
            .write_all(b"Open YouTube\r\n")
            .await
            .unwrap();
        assert_eq!(read_line(&mut client).await, YOUTUBE_HINT);
        assert_eq!(read_line(&mut client).await, ACK);

        client.get_mut().write_all(b"exit\n").await.unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        handle.await.unwrap().unwrap();
        assert_eq!(recorder.calls(), vec!["open youtube"]);
    }

    #[tokio::test]
    async fn test_unknown_command_acks_without_effect() {
        let recorder = Arc::new(Recorder::default());
        let (addr, handle) = start(recorder.clone());

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = BufReader::new(stream);

        client
            .get_mut()
            .write_all(b"play never gonna give you up\n")
            .await
            .unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        client.get_mut().write_all(b"exit\n").await.unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        handle.await.unwrap().unwrap();
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_volume_commands_dispatch_in_order() {
        let recorder = Arc::new(Recorder::default());
        let (addr, handle) = start(recorder.clone());

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = BufReader::new(stream);

        client.get_mut().write_all(b"VOL+\r\n").await.unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        client.get_mut().write_all(b"vol-\n").await.unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        client.get_mut().write_all(b"exit\n").await.unwrap();
        assert_eq!(read_line(&mut client).await, ACK);

        handle.await.unwrap().unwrap();
        assert_eq!(recorder.calls(), vec!["vol+", "vol-"]);
    }

    #[tokio::test]
    async fn test_peer_close_ends_session_cleanly() {
        let recorder = Arc::new(Recorder::default());
        let (addr, handle) = start(recorder.clone());

        let client = TcpStream::connect(addr).await.unwrap();
        drop(client);

        // No reply, no error; run() resolves Ok
        handle.await.unwrap().unwrap();
        assert!(recorder.calls().is_empty());
    }
}

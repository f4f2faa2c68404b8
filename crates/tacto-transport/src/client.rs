//! TUIO client session runtime
//!
//! `connect` binds the UDP socket (the only fatal failure: a bind error
//! leaves the session unstarted) and spawns the receive task. The task
//! runs the whole decode -> stage -> commit pipeline synchronously per
//! datagram; listener callbacks fire on it and must not block. Malformed
//! datagrams are logged and dropped, the loop continues. `disconnect`
//! tears the task down and discards all session state immediately; no
//! final flush.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use tacto_core::{TactoError, TactoResult, TuioCursor, TuioObject};
use tacto_tuio::{TuioDecoder, TuioListener};

use crate::udp::{UdpEndpoint, MAX_DATAGRAM_SIZE};

/// Default TUIO listening port
pub const DEFAULT_TUIO_PORT: u16 = 3333;

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Local address to bind
    pub host: IpAddr,
    /// Listening port; 0 picks an ephemeral port
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_TUIO_PORT,
        }
    }
}

/// A running (or startable) TUIO session
///
/// The session epoch is established when the client is created; all event
/// and entity times are relative to it.
pub struct TuioClient {
    config: ClientConfig,
    decoder: Arc<TuioDecoder>,
    receive_task: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl TuioClient {
    /// Create a client listening on the default TUIO port
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        TuioClient {
            config,
            decoder: Arc::new(TuioDecoder::with_session_clock()),
            receive_task: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    /// Bind the socket and start the receive loop
    pub async fn connect(&self) -> TactoResult<()> {
        if self.receive_task.lock().is_some() {
            return Err(TactoError::AlreadyConnected);
        }

        let endpoint = UdpEndpoint::bind(SocketAddr::new(self.config.host, self.config.port)).await?;

        let mut task = self.receive_task.lock();
        if task.is_some() {
            return Err(TactoError::AlreadyConnected);
        }
        *self.local_addr.lock() = Some(endpoint.local_addr());

        let socket = endpoint.socket();
        let decoder = Arc::clone(&self.decoder);
        *task = Some(tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, _)) => {
                        if let Err(e) = decoder.process_datagram(&buf[..len]) {
                            tracing::warn!("dropping malformed datagram: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("UDP receive error: {}", e);
                    }
                }
            }
        }));

        Ok(())
    }

    /// Stop the receive loop and discard all session state
    pub fn disconnect(&self) {
        if let Some(task) = self.receive_task.lock().take() {
            task.abort();
        }
        *self.local_addr.lock() = None;
        self.decoder.reset();
    }

    pub fn is_connected(&self) -> bool {
        self.receive_task.lock().is_some()
    }

    /// The bound address while connected
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Register a listener; safe at any time, fires no events itself
    pub fn add_listener(&self, listener: Arc<dyn TuioListener>) {
        self.decoder.add_listener(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn TuioListener>) {
        self.decoder.remove_listener(listener);
    }

    pub fn clear_listeners(&self) {
        self.decoder.clear_listeners();
    }

    /// Snapshot of all currently active objects
    pub fn objects(&self) -> Vec<TuioObject> {
        self.decoder.objects()
    }

    /// Snapshot of all currently active cursors
    pub fn cursors(&self) -> Vec<TuioCursor> {
        self.decoder.cursors()
    }

    pub fn object(&self, session_id: i64) -> Option<TuioObject> {
        self.decoder.object(session_id)
    }

    pub fn cursor(&self, session_id: i64) -> Option<TuioCursor> {
        self.decoder.cursor(session_id)
    }
}

impl Default for TuioClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TuioClient {
    fn drop(&mut self) {
        if let Some(task) = self.receive_task.lock().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tacto_osc::{OscBundle, OscMessage};
    use tacto_tuio::CURSOR_ADDRESS;
    use tokio::sync::mpsc;

    struct Forwarder {
        tx: mpsc::UnboundedSender<(i64, i32)>,
    }

    impl TuioListener for Forwarder {
        fn add_tuio_cursor(&self, cursor: &TuioCursor) {
            let _ = self.tx.send((cursor.session_id(), cursor.cursor_id()));
        }
    }

    fn touch_frame(session_id: i32, x: f32, y: f32, fseq: i32) -> Vec<u8> {
        OscBundle::new()
            .with(
                OscMessage::new(CURSOR_ADDRESS)
                    .with("set")
                    .with(session_id)
                    .with(x)
                    .with(y)
                    .with(0.0f32)
                    .with(0.0f32)
                    .with(0.0f32),
            )
            .with(
                OscMessage::new(CURSOR_ADDRESS)
                    .with("alive")
                    .with(session_id),
            )
            .with(OscMessage::new(CURSOR_ADDRESS).with("fseq").with(fseq))
            .encode()
    }

    #[tokio::test]
    async fn test_connect_disconnect() {
        let client = TuioClient::with_config(ClientConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
        });
        assert!(!client.is_connected());

        client.connect().await.unwrap();
        assert!(client.is_connected());
        assert!(matches!(
            client.connect().await,
            Err(TactoError::AlreadyConnected)
        ));

        client.disconnect();
        assert!(!client.is_connected());
        assert!(client.cursors().is_empty());
    }

    #[tokio::test]
    async fn test_receives_and_decodes_datagrams() {
        let client = TuioClient::with_config(ClientConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        client.add_listener(Arc::new(Forwarder { tx }));
        client.connect().await.unwrap();

        let dest = client.local_addr().unwrap();
        let sender = UdpEndpoint::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        sender
            .send_bytes_to(&touch_frame(1, 0.5, 0.5, 1), dest)
            .await
            .unwrap();

        let (session_id, cursor_id) =
            tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for the add event")
                .expect("listener channel closed");
        assert_eq!(session_id, 1);
        assert_eq!(cursor_id, 0);
        assert_eq!(client.cursors().len(), 1);

        client.disconnect();
    }
}

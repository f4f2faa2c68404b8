//! UDP endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use tacto_core::{TactoError, TactoResult};
use tacto_osc::OscPacket;

/// Largest datagram the receive loop will accept (UDP payload ceiling)
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// A bound UDP socket for OSC datagrams
pub struct UdpEndpoint {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
}

impl UdpEndpoint {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> TactoResult<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TactoError::Transport(e.to_string()))?;

        let local_addr = socket
            .local_addr()
            .map_err(|e| TactoError::Transport(e.to_string()))?;

        Ok(UdpEndpoint {
            socket: Arc::new(socket),
            local_addr,
        })
    }

    /// Get local address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Encode and send an OSC packet to a destination
    pub async fn send_packet(&self, packet: &OscPacket, dest: SocketAddr) -> TactoResult<()> {
        self.send_bytes_to(&packet.encode(), dest).await
    }

    /// Send raw bytes to a destination
    pub async fn send_bytes_to(&self, bytes: &[u8], dest: SocketAddr) -> TactoResult<()> {
        self.socket
            .send_to(bytes, dest)
            .await
            .map_err(|e| TactoError::Transport(e.to_string()))?;
        Ok(())
    }

    /// Receive one datagram (blocking)
    pub async fn recv_from(&self) -> TactoResult<(Vec<u8>, SocketAddr)> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let (len, addr) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(|e| TactoError::Transport(e.to_string()))?;

        buf.truncate(len);
        Ok((buf, addr))
    }

    /// Get a clone of the socket for concurrent operations
    pub fn socket(&self) -> Arc<UdpSocket> {
        Arc::clone(&self.socket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacto_osc::OscMessage;

    #[tokio::test]
    async fn test_bind_ephemeral() {
        let endpoint = UdpEndpoint::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_ne!(endpoint.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn test_send_and_receive_packet() {
        let receiver = UdpEndpoint::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let sender = UdpEndpoint::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        let packet = OscPacket::Message(OscMessage::new("/ping").with(1i32));
        sender
            .send_packet(&packet, receiver.local_addr())
            .await
            .unwrap();

        let (bytes, from) = receiver.recv_from().await.unwrap();
        assert_eq!(from.port(), sender.local_addr().port());
        assert_eq!(OscPacket::decode(&bytes).unwrap(), packet);
    }
}

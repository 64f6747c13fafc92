use serde::{Deserialize, Serialize};
use std::io::ErrorKind;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{PlayerId, Reply};

/// Something the player did in the chat.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub enum Event {
    /// The start command, optionally carrying the deep-link payload.
    Start { payload: Option<String> },
    /// A reply button was pressed.
    Press { selector: String },
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub enum Request {
    Hello { player: PlayerId }, // must be the first packet of a connection
    Event(Event),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Response {
    Welcome { player: PlayerId },
    Reply(Reply),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Packet {
    RequestPacket(Request),
    ResponsePacket(Response),
    Error,
}

/// Client side of a connection, as opened by [`Connection::connect`].
pub type ClientConnection = Connection<MaybeTlsStream<TcpStream>>;

pub struct Connection<S = TcpStream> {
    socket: WebSocketStream<S>,
}

impl Connection<TcpStream> {
    pub async fn from_tcp_stream(connection: TcpStream) -> anyhow::Result<Self> {
        let socket = tokio_tungstenite::accept_async(connection).await?;
        Ok(Self { socket })
    }
}

impl ClientConnection {
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let (socket, _) = tokio_tungstenite::connect_async(address).await?;
        Ok(Self { socket })
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Reads the next packet. A closed socket surfaces as `ErrorKind::ConnectionAborted`.
    pub async fn read(&mut self) -> anyhow::Result<Packet> {
        loop {
            let message = self
                .socket
                .next()
                .await
                .ok_or(std::io::Error::new(ErrorKind::ConnectionAborted, "connection closed"))??;
            match message {
                Message::Binary(data) => return Ok(rmp_serde::from_slice(&data)?),
                Message::Close(_) => {
                    return Err(
                        std::io::Error::new(ErrorKind::ConnectionAborted, "connection closed").into(),
                    )
                }
                // tungstenite answers pings itself
                Message::Ping(_) | Message::Pong(_) => continue,
                _ => anyhow::bail!("incorrect data type received"),
            }
        }
    }

    pub async fn send(&mut self, data: Packet) -> anyhow::Result<()> {
        let buf = rmp_serde::to_vec(&data)?;
        Ok(self.socket.send(Message::Binary(buf)).await?)
    }

    pub async fn close(&mut self) -> anyhow::Result<()> {
        Ok(self.socket.close(None).await?)
    }
}

/// True when the error is the orderly end of a connection rather than a fault.
pub fn is_disconnect(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<std::io::Error>()
        .map(|error| error.kind() == ErrorKind::ConnectionAborted)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Move, Selector};

    #[test]
    fn packets_survive_messagepack_framing() {
        let packet = Packet::ResponsePacket(Response::Reply(
            Reply::edit("Choose your gesture:")
                .with_action(Action::callback(Move::Rock.label(), Selector::PvpMove(Move::Rock))),
        ));
        let buf = rmp_serde::to_vec(&packet).unwrap();
        assert_eq!(rmp_serde::from_slice::<Packet>(&buf).unwrap(), packet);
    }

    #[test]
    fn disconnects_are_recognised() {
        let closed: anyhow::Error =
            std::io::Error::new(ErrorKind::ConnectionAborted, "connection closed").into();
        assert!(is_disconnect(&closed));
        assert!(!is_disconnect(&anyhow::anyhow!("malformed request")));
    }

    #[tokio::test]
    async fn client_and_server_exchange_packets() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("ws://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut connection = Connection::from_tcp_stream(stream).await.unwrap();
            let packet = connection.read().await.unwrap();
            assert_eq!(packet, Packet::RequestPacket(Request::Hello { player: 7 }));
            connection
                .send(Packet::ResponsePacket(Response::Welcome { player: 7 }))
                .await
                .unwrap();
            assert!(is_disconnect(&connection.read().await.unwrap_err()));
        });

        let mut client = Connection::connect(&address).await.unwrap();
        client
            .send(Packet::RequestPacket(Request::Hello { player: 7 }))
            .await
            .unwrap();
        assert_eq!(
            client.read().await.unwrap(),
            Packet::ResponsePacket(Response::Welcome { player: 7 })
        );
        client.close().await.unwrap();
        server.await.unwrap();
    }
}

use anyhow::bail;
use common::network::{is_disconnect, Connection, Packet, Request, Response};
use common::PlayerId;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::game_manager::GameRequest;
use crate::mailroom::MailRequest;

const OUTBOX_CAPACITY: usize = 32;

pub async fn handle_listen_server(
    listener: TcpListener,
    game_tx: mpsc::Sender<GameRequest>,
    mail_tx: mpsc::Sender<MailRequest>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(?err, "failed to accept connection");
                continue;
            }
        };
        let game_tx = game_tx.clone();
        let mail_tx = mail_tx.clone();

        tokio::spawn(async move {
            match Connection::from_tcp_stream(stream).await {
                Ok(connection) => handle_connection(connection, game_tx, mail_tx).await,
                Err(err) => warn!(%peer, ?err, "websocket handshake failed"),
            }
        });
    }
}

async fn handle_connection(
    mut connection: Connection,
    game_tx: mpsc::Sender<GameRequest>,
    mail_tx: mpsc::Sender<MailRequest>,
) {
    let player = match handle_login(&mut connection).await {
        Ok(player) => player,
        Err(err) => {
            warn!(?err, "login failed");
            let _ = connection.send(Packet::Error).await;
            return;
        }
    };

    let (outbox_tx, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);
    let registered = mail_tx
        .send(MailRequest::Register {
            player,
            outbox: outbox_tx.clone(),
        })
        .await;
    if registered.is_err() {
        warn!(player, "mailroom is gone");
        return;
    }
    info!(player, "player connected");

    if let Err(err) = handle_client(player, &mut connection, outbox_rx, &game_tx, &mail_tx).await {
        warn!(player, ?err, "closing connection");
        let _ = connection.send(Packet::Error).await;
    }

    let _ = mail_tx
        .send(MailRequest::Unregister {
            player,
            outbox: outbox_tx,
        })
        .await;
    info!(player, "player disconnected");
}

async fn handle_login(connection: &mut Connection) -> anyhow::Result<PlayerId> {
    let packet = connection.read().await?;
    match packet {
        Packet::RequestPacket(Request::Hello { player }) => {
            connection
                .send(Packet::ResponsePacket(Response::Welcome { player }))
                .await?;
            Ok(player)
        }
        _ => bail!("Invalid request at login: {:?}", packet),
    }
}

async fn handle_client(
    player: PlayerId,
    connection: &mut Connection,
    mut outbox: mpsc::Receiver<Packet>,
    game_tx: &mpsc::Sender<GameRequest>,
    mail_tx: &mpsc::Sender<MailRequest>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            packet = connection.read() => {
                let event = match packet {
                    Ok(Packet::RequestPacket(Request::Event(event))) => event,
                    Ok(Packet::RequestPacket(Request::Hello { .. })) => {
                        bail!("Attempted re-login - denied");
                    }
                    Ok(pack) => bail!("incorrect packet type: {:?}", pack),
                    Err(error) if is_disconnect(&error) => return Ok(()),
                    Err(error) => return Err(error),
                };

                let (resp_tx, resp_rx) = oneshot::channel();
                game_tx
                    .send(GameRequest::HandleEvent {
                        player,
                        event,
                        responder: resp_tx,
                    })
                    .await?;
                match resp_rx.await? {
                    Ok(deliveries) => mail_tx.send(MailRequest::Deliver { deliveries }).await?,
                    Err(err) => {
                        warn!(player, ?err, "event handling failed");
                        connection.send(Packet::Error).await?;
                    }
                }
            }
            Some(packet) = outbox.recv() => {
                connection.send(packet).await?;
            }
        }
    }
}

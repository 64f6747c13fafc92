mod terminal;

use anyhow::bail;
use clap::Parser;
use common::network::{is_disconnect, Connection, Packet, Request, Response};
use common::{Action, PlayerId, ReplyKind};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::terminal::{parse_input, render, Input, HELP};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal chat for the rock-paper-scissors service", long_about = None)]
struct Args {
    #[arg(long, default_value = "ws://127.0.0.1:6379")]
    server: String,

    /// Chat id to play as.
    #[arg(long)]
    player: PlayerId,

    /// Deep-link payload sent with the first start command, e.g. an inviter's id.
    #[arg(long)]
    start: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut connection = Connection::connect(&args.server).await?;
    connection
        .send(Packet::RequestPacket(Request::Hello {
            player: args.player,
        }))
        .await?;
    match connection.read().await? {
        Packet::ResponsePacket(Response::Welcome { .. }) => {}
        other => bail!("unexpected greeting: {:?}", other),
    }
    connection
        .send(Packet::RequestPacket(Request::Event(
            common::network::Event::Start {
                payload: args.start,
            },
        )))
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut actions: Vec<Action> = vec![];
    loop {
        tokio::select! {
            packet = connection.read() => {
                match packet {
                    Ok(Packet::ResponsePacket(Response::Reply(reply))) => {
                        println!("{}\n", render(&reply));
                        // alerts pop over the last message and keep its buttons
                        if reply.kind != ReplyKind::Alert {
                            actions = reply.actions;
                        }
                    }
                    Ok(Packet::Error) => eprintln!("the server could not handle that"),
                    Ok(other) => eprintln!("unexpected packet: {:?}", other),
                    Err(error) if is_disconnect(&error) => break,
                    Err(error) => return Err(error),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line, &actions) {
                    Input::Send(event) => {
                        connection.send(Packet::RequestPacket(Request::Event(event))).await?;
                    }
                    Input::Open(url) => println!("open {url} to use this link\n"),
                    Input::Quit => break,
                    Input::Help => println!("{HELP}\n"),
                }
            }
        }
    }

    let _ = connection.close().await;
    Ok(())
}

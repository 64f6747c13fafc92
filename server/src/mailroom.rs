use std::collections::HashMap;

use common::network::{Packet, Response};
use common::PlayerId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::game_manager::Delivery;

pub enum MailRequest {
    Register {
        player: PlayerId,
        outbox: mpsc::Sender<Packet>,
    },
    Unregister {
        player: PlayerId,
        outbox: mpsc::Sender<Packet>,
    },
    Deliver {
        deliveries: Vec<Delivery>,
    },
}

/// Routes replies to whichever connection each player currently has open.
pub struct Mailroom {
    work_queue: mpsc::Receiver<MailRequest>,
    outboxes: HashMap<PlayerId, mpsc::Sender<Packet>>,
}

impl Mailroom {
    pub fn new(work_queue: mpsc::Receiver<MailRequest>) -> Self {
        Self {
            work_queue,
            outboxes: HashMap::new(),
        }
    }

    pub async fn manage(&mut self) {
        while let Some(request) = self.work_queue.recv().await {
            match request {
                MailRequest::Register { player, outbox } => {
                    // the newest connection of a player takes over
                    self.outboxes.insert(player, outbox);
                }
                MailRequest::Unregister { player, outbox } => {
                    if self
                        .outboxes
                        .get(&player)
                        .is_some_and(|current| current.same_channel(&outbox))
                    {
                        self.outboxes.remove(&player);
                    }
                }
                MailRequest::Deliver { deliveries } => self.deliver(deliveries),
            }
        }
    }

    fn deliver(&mut self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            let Some(outbox) = self.outboxes.get(&delivery.recipient) else {
                debug!(recipient = delivery.recipient, "recipient offline, reply dropped");
                continue;
            };
            let packet = Packet::ResponsePacket(Response::Reply(delivery.reply));
            if let Err(err) = outbox.try_send(packet) {
                warn!(recipient = delivery.recipient, %err, "reply dropped");
            }
        }
    }
}

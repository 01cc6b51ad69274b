//! Command dispatch.
//!
//! The router turns a text payload from one peer into frames for
//! others: broadcast, unicast, or a reply to the sender. Frames are
//! encoded once and shared by every recipient.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::envelope::{self, Command, Outbound, ChatMessage, ClientInfo, Recipient};
use crate::envelope::{normalize_name, utf16_len, MAX_MESSAGE_LEN};
use crate::error::RouteError;
use crate::frame::encode_text;
use crate::registry::{Peer, Registry, Sink};

/// Serialize and frame an envelope.
fn to_frame(out: &Outbound) -> Option<Arc<[u8]>> {
    match serde_json::to_string(out) {
        Ok(json) => Some(encode_text(&json).into()),
        Err(e) => {
            warn!("failed to serialize envelope: {}", e);
            None
        }
    }
}

/// Routes envelopes between the peers of one registry.
#[derive(Debug)]
pub struct Router<S> {
    registry: Registry<S>,
    require_name: bool,
}

impl<S: Sink> Router<S> {
    #[inline]
    pub fn new(registry: Registry<S>) -> Self {
        Self {
            registry,
            require_name: false,
        }
    }

    /// Reject chat messages from peers which have not set a name.
    #[inline]
    pub fn require_name(mut self, require: bool) -> Self {
        self.require_name = require;
        self
    }

    #[inline]
    pub fn registry(&self) -> &Registry<S> { &self.registry }

    /// Register a new connection.
    ///
    /// The peer gets its id before anything else, then everyone
    /// gets the updated presence snapshot.
    pub fn connect(&self, sink: S) -> String {
        let id = self.registry.add_with(sink, |peer| {
            if let Some(frame) = to_frame(&Outbound::Id { id: &peer.id }) {
                peer.sink.deliver(frame);
            }
        });
        info!("{} connected, {} online", id, self.registry.len());
        self.broadcast_presence();
        id
    }

    /// Unregister a connection, returns false if it was already gone.
    ///
    /// Close, error and close frame all end up here; only
    /// the first call broadcasts presence.
    pub fn disconnect(&self, id: &str) -> bool {
        match self.registry.remove(id) {
            Some(peer) => {
                info!(
                    "{}({}) disconnected, {} online",
                    peer.id,
                    peer.display_name(),
                    self.registry.len()
                );
                self.broadcast_presence();
                true
            }
            None => false,
        }
    }

    /// Push the presence snapshot to every peer.
    ///
    /// Runs under the registry lock, so concurrent joins and leaves
    /// can not reorder snapshots and the last one a peer receives is
    /// always current.
    pub fn broadcast_presence(&self) {
        self.registry.with_peers(|peers| {
            let clients = peers
                .iter()
                .map(|p| ClientInfo {
                    id: &p.id,
                    name: p.display_name(),
                })
                .collect();

            if let Some(frame) = to_frame(&Outbound::ClientList { clients }) {
                for peer in peers.iter() {
                    peer.sink.deliver(frame.clone());
                }
            }
        })
    }

    /// Handle a text message from `id`.
    pub fn handle_text(&self, id: &str, payload: &str) {
        let sender = match self.registry.find_by_id(id) {
            Some(p) => p,
            None => {
                debug!("{}: drop message from a removed peer", id);
                return;
            }
        };

        let cmd = match envelope::parse(payload) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!("{}: {}", id, e);
                return self.reply_error(&sender, e);
            }
        };

        match cmd {
            Command::SetName { name } => {
                let name = normalize_name(&name, id);
                debug!("{}: set name {}", id, name);
                if self.registry.set_name(id, name) {
                    self.broadcast_presence();
                }
            }
            Command::Typing { to } => self.typing(&sender, to.as_ref()),
            Command::Chat { msg, to } => self.chat(&sender, &msg, to.as_ref()),
        }
    }

    fn reply_error(&self, sender: &Peer<S>, e: RouteError) {
        if let Some(frame) = to_frame(&e.into()) {
            sender.sink.deliver(frame);
        }
    }

    fn typing(&self, sender: &Peer<S>, to: Option<&Recipient>) {
        let frame = match to_frame(&Outbound::Typing {
            from: &sender.id,
            name: sender.display_name(),
            to,
        }) {
            Some(f) => f,
            None => return,
        };

        match to {
            // absent recipient is not an error
            Some(to) => {
                if let Some(peer) = to.id().and_then(|id| self.registry.find_by_id(id)) {
                    peer.sink.deliver(frame);
                }
            }
            None => {
                for peer in self.registry.all().iter().filter(|p| p.id != sender.id) {
                    peer.sink.deliver(frame.clone());
                }
            }
        }
    }

    fn chat(&self, sender: &Peer<S>, msg: &str, to: Option<&Recipient>) {
        let text = msg.trim();
        if text.is_empty() {
            return;
        }

        if self.require_name && sender.name.is_none() {
            return self.reply_error(sender, RouteError::Unnamed);
        }

        if utf16_len(text) > MAX_MESSAGE_LEN {
            return self.reply_error(sender, RouteError::TooLong);
        }

        let message = ChatMessage {
            from: &sender.id,
            from_name: sender.display_name(),
            msg: text,
            is_private: to.is_some(),
            is_sent: None,
            delivered: None,
            to: None,
        };

        let to = match to {
            Some(to) => to,
            None => {
                // everyone, sender included
                if let Some(frame) = to_frame(&Outbound::Message(message)) {
                    for peer in self.registry.all().iter() {
                        peer.sink.deliver(frame.clone());
                    }
                }
                return;
            }
        };

        let recipient = to.id().and_then(|id| self.registry.find_by_id(id));
        if let Some(peer) = &recipient {
            if let Some(frame) = to_frame(&Outbound::Message(message.clone())) {
                peer.sink.deliver(frame);
            }
        }
        debug!("{}: private message to {:?}, delivered: {}", sender.id, to, recipient.is_some());

        // the ack is the sender's only delivery signal
        let ack = ChatMessage {
            is_sent: Some(true),
            delivered: Some(recipient.is_some()),
            to: Some(to),
            ..message
        };
        if let Some(frame) = to_frame(&Outbound::Message(ack)) {
            sender.sink.deliver(frame);
        }
    }
}

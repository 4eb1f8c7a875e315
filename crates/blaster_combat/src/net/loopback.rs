//! In-process transport: один server App + N client App
//!
//! Каждое сообщение проходит через wire codec (encode → bytes → decode),
//! поэтому loopback ловит те же ошибки сериализации, что и реальный
//! transport. Доставка reliable ordered.

use bevy::prelude::*;

use super::protocol::{decode_message, encode_message, ProtocolError};
use super::{ClientId, NetInbox, NetOutbox, NetRole, Sender};
use crate::logger;

pub struct LoopbackNetwork {
    pub server: App,
    pub clients: Vec<App>,
}

impl LoopbackNetwork {
    /// Server App (NetRole выставляется в Server)
    pub fn new(mut server: App) -> Self {
        server.insert_resource(NetRole::Server);
        Self {
            server,
            clients: Vec::new(),
        }
    }

    /// Подключить клиента (NetRole выставляется в Client)
    pub fn add_client(&mut self, mut client: App) -> ClientId {
        client.insert_resource(NetRole::Client);
        self.clients.push(client);

        let id = (self.clients.len() - 1) as ClientId;
        logger::log_info(&format!("Loopback: client {} connected", id));
        id
    }

    pub fn client(&self, id: ClientId) -> Option<&App> {
        self.clients.get(id as usize)
    }

    pub fn client_mut(&mut self, id: ClientId) -> Option<&mut App> {
        self.clients.get_mut(id as usize)
    }

    /// Доставить всё из outbox'ов в inbox'ы другой стороны
    ///
    /// Возвращает число доставленных сообщений (server broadcast считается
    /// по разу на клиента).
    pub fn pump(&mut self) -> Result<usize, ProtocolError> {
        let mut delivered = 0;

        // Clients → server
        for (index, client) in self.clients.iter_mut().enumerate() {
            let outgoing = drain_outbox(client);
            if outgoing.is_empty() {
                continue;
            }

            let mut decoded = Vec::with_capacity(outgoing.len());
            for message in &outgoing {
                decoded.push(decode_message(&encode_message(message)?)?);
            }

            if let Some(mut inbox) = self.server.world_mut().get_resource_mut::<NetInbox>() {
                for message in decoded {
                    inbox.push(Sender::Client(index as ClientId), message);
                    delivered += 1;
                }
            }
        }

        // Server → all clients
        let broadcast = drain_outbox(&mut self.server);
        let mut frames = Vec::with_capacity(broadcast.len());
        for message in &broadcast {
            frames.push(encode_message(message)?);
        }

        for client in self.clients.iter_mut() {
            let Some(mut inbox) = client.world_mut().get_resource_mut::<NetInbox>() else {
                continue;
            };
            for frame in &frames {
                inbox.push(Sender::Server, decode_message(frame)?);
                delivered += 1;
            }
        }

        Ok(delivered)
    }

    /// Один сетевой кадр: clients → server → clients
    ///
    /// Клиенты обновляются первыми (input), server видит их сообщения в
    /// том же кадре, ответы server клиенты применят на следующем update.
    pub fn update(&mut self) -> Result<(), ProtocolError> {
        for client in self.clients.iter_mut() {
            client.update();
        }
        self.pump()?;

        self.server.update();
        self.pump()?;

        Ok(())
    }
}

fn drain_outbox(app: &mut App) -> Vec<super::NetMessage> {
    app.world_mut()
        .get_resource_mut::<NetOutbox>()
        .map(|mut outbox| outbox.drain())
        .unwrap_or_default()
}

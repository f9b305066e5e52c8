//! WebSocket relay and connection handling.

use crate::room::{RoomError, SessionRoom};
use bonsai_core::protocol::{ClientMessage, ServerMessage};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// Open sessions by id
    pub rooms: DashMap<String, SessionRoom>,
    /// Mapping from connection ID to its session ID
    pub member_rooms: DashMap<Uuid, String>,
    /// Mapping from connection ID to its message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            member_rooms: DashMap::new(),
            senders: DashMap::new(),
        }
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, member: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&member) {
            let _ = sender.send(msg);
        }
    }

    /// Send a message to every listed connection.
    pub fn send_to_all(&self, members: &[Uuid], msg: ServerMessage) {
        for member in members {
            self.send_to(*member, msg.clone());
        }
    }

    fn reject(&self, member: Uuid, err: RoomError) {
        debug!(%member, %err, "request rejected");
        self.send_to(
            member,
            ServerMessage::Rejected {
                reason: err.to_string(),
            },
        );
    }

    fn room_of(&self, member: Uuid) -> Option<String> {
        self.member_rooms.get(&member).map(|id| id.value().clone())
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the WebSocket relay.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Bonsai relay listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let member = Uuid::new_v4();
    info!(%member, "New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(member, tx);

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(member, client_msg, &state),
                Err(e) => warn!(%member, "Invalid message: {}", e),
            },
            Ok(Message::Close(_)) => {
                info!(%member, "Client closing connection");
                break;
            }
            Err(e) => {
                error!(%member, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_leave(member, &state);
    state.senders.remove(&member);
    send_task.abort();

    info!(%member, "Connection closed");
    Ok(())
}

/// Handle a client message.
pub fn handle_message(member: Uuid, msg: ClientMessage, state: &ServerState) {
    match msg {
        ClientMessage::CreateSession {
            game_id,
            session_id,
            player_name,
        } => {
            if state.member_rooms.contains_key(&member) {
                return state.reject(member, RoomError::AlreadyInSession);
            }
            let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            match state.rooms.entry(session_id.clone()) {
                Entry::Occupied(_) => state.reject(member, RoomError::SessionExists(session_id)),
                Entry::Vacant(slot) => {
                    info!(%session_id, %game_id, host = %player_name, "session created");
                    slot.insert(SessionRoom::new(
                        session_id.clone(),
                        game_id,
                        member,
                        player_name,
                    ));
                    state.member_rooms.insert(member, session_id.clone());
                    state.send_to(member, ServerMessage::SessionCreated { session_id });
                }
            }
        }

        ClientMessage::JoinSession {
            session_id,
            player_name,
        } => {
            if state.member_rooms.contains_key(&member) {
                return state.reject(member, RoomError::AlreadyInSession);
            }
            let joined = match state.rooms.get_mut(&session_id) {
                Some(mut room) => room
                    .add_member(member, player_name.clone())
                    .map(|seated| (seated, room.others(member))),
                None => Err(RoomError::SessionNotFound),
            };
            // Room lock released before sending
            match joined {
                Ok((opponent_names, others)) => {
                    info!(%session_id, name = %player_name, "player joined");
                    state.member_rooms.insert(member, session_id.clone());
                    state.send_to(
                        member,
                        ServerMessage::Joined {
                            session_id,
                            opponent_names,
                        },
                    );
                    state.send_to_all(&others, ServerMessage::PlayerJoined { name: player_name });
                }
                Err(e) => state.reject(member, e),
            }
        }

        ClientMessage::StartGame(start) => {
            let Some(session_id) = state.room_of(member) else {
                warn!(%member, "StartGame outside a session");
                return;
            };
            let started = match state.rooms.get_mut(&session_id) {
                Some(mut room) => room.start_game(member).map(|()| room.others(member)),
                None => Err(RoomError::SessionNotFound),
            };
            match started {
                Ok(others) => {
                    info!(%session_id, players = start.players.len(), "game started");
                    state.send_to_all(&others, ServerMessage::StartGame(start));
                }
                Err(e) => warn!(%member, %session_id, "StartGame refused: {}", e),
            }
        }

        ClientMessage::Turn(message) => {
            let Some(session_id) = state.room_of(member) else {
                warn!(%member, "Turn outside a session");
                return;
            };
            let relayed = match state.rooms.get(&session_id) {
                Some(room) => room
                    .turn_sender(member)
                    .map(|from| (from, room.others(member))),
                None => Err(RoomError::SessionNotFound),
            };
            match relayed {
                Ok((from, others)) => {
                    debug!(%session_id, %from, "relaying turn");
                    state.send_to_all(&others, ServerMessage::Turn { from, message });
                }
                Err(e) => warn!(%member, %session_id, "Turn refused: {}", e),
            }
        }

        ClientMessage::Leave => handle_leave(member, state),
    }
}

/// Remove a connection from its session, closing the session when the host
/// leaves.
fn handle_leave(member: Uuid, state: &ServerState) {
    let Some((_, session_id)) = state.member_rooms.remove(&member) else {
        return;
    };

    let outcome = state.rooms.get_mut(&session_id).map(|mut room| {
        room.remove_member(member)
            .map(|departure| (departure, room.others(member)))
    });
    let Some(Ok((departure, others))) = outcome else {
        return;
    };

    info!(%session_id, name = %departure.name, "player left");
    state.send_to_all(
        &others,
        ServerMessage::PlayerLeft {
            name: departure.name,
        },
    );

    if departure.closes_room {
        info!(%session_id, "session closed");
        state.rooms.remove(&session_id);
        for other in others {
            state.member_rooms.remove(&other);
        }
    }
}

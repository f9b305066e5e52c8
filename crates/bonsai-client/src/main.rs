//! Headless Bonsai client.
//!
//! Connects to the relay, hosts or joins a session and lets a random bot play
//! the local seat (and, when hosting, the bot seats).

use bonsai_core::goals::GoalColor;
use bonsai_core::protocol::{ClientMessage, ServerMessage};
use bonsai_core::session::{ConnectionState, SessionCoordinator};
use bonsai_core::Bot;
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod pacing;

use config::ClientConfig;
use pacing::TurnPacer;

/// Goal colors in play
const GOAL_COLORS: usize = 3;

type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

async fn send_all(ws_sender: &mut WsWrite, messages: Vec<ClientMessage>) -> anyhow::Result<()> {
    for msg in messages {
        ws_sender
            .send(Message::Text(serde_json::to_string(&msg)?))
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env()?;
    info!(
        name = %config.name,
        server = %config.network.server_addr,
        host = config.host,
        "Starting Bonsai client..."
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut bot = match config.seed {
        Some(seed) => Bot::with_seed(seed),
        None => Bot::new(),
    };

    let (ws_stream, _) = connect_async(config.network.server_addr.as_str()).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let mut session = SessionCoordinator::new(config.network.clone(), config.name.clone());
    session.on_connected()?;
    let opening = if config.host {
        session.host(config.session.clone())?
    } else {
        let id = config.session.clone().unwrap_or_default();
        session.join(id)?
    };
    send_all(&mut ws_sender, opening).await?;

    let mut pacer = TurnPacer::new();
    let (ready_tx, mut ready_rx) = mpsc::unbounded_channel::<()>();

    loop {
        tokio::select! {
            frame = ws_receiver.next() => {
                let Some(frame) = frame else {
                    session.on_disconnected();
                    break;
                };
                let text = match frame? {
                    Message::Text(text) => text,
                    Message::Close(_) => {
                        session.on_disconnected();
                        break;
                    }
                    _ => continue,
                };
                let message: ServerMessage = match serde_json::from_str(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("Invalid message from relay: {}", e);
                        continue;
                    }
                };
                let out = session.handle(message)?;
                send_all(&mut ws_sender, out).await?;

                if session.state() == ConnectionState::WaitingForGuests
                    && session.peers().len() + 1 >= config.players
                {
                    let goals = GoalColor::ALL
                        .choose_multiple(&mut rng, GOAL_COLORS)
                        .copied()
                        .collect();
                    let out = session.start_game_with_rng(config.bots, config.speed, goals, &mut rng)?;
                    send_all(&mut ws_sender, out).await?;
                }
            }
            Some(()) = ready_rx.recv() => {
                pacer.cancel();
                if session.state() == ConnectionState::PlayingMyTurn {
                    bot.play_turn(session.game_mut())?;
                    let out = session.submit_turn()?;
                    send_all(&mut ws_sender, out).await?;
                }
            }
        }

        match session.state() {
            ConnectionState::PlayingMyTurn if !pacer.is_armed() => {
                let delay = session.game().state()?.speed.turn_delay();
                pacer.schedule(delay, ready_tx.clone());
            }
            ConnectionState::GameOver => {
                if let Some(ranking) = &session.game().state()?.ranking {
                    for (place, score) in ranking.iter().enumerate() {
                        info!(place = place + 1, name = %score.name, total = score.total, "final score");
                    }
                }
                break;
            }
            ConnectionState::Disconnected => break,
            _ => {}
        }
    }

    pacer.cancel();
    let farewell = session.leave();
    if send_all(&mut ws_sender, farewell).await.is_ok() {
        let _ = ws_sender.close().await;
    }
    info!("Client finished");
    Ok(())
}

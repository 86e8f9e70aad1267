//! WebSocket session handler.
//!
//! Each upgraded connection runs the handshake inline, then splits into a
//! receive loop (frames from this client) and a pusher loop (everything queued
//! for this client). Whichever loop ends first tears the other one down, after
//! which the connection leaves its room.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Serialize;
use thiserror::Error;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::{
    domain::{
        Connection, Identity, PusherChannel, PusherReceiver, RoomId, SessionState,
        ValueObjectError, outbound,
    },
    infrastructure::dto::websocket::{
        AuthFailedMessage, AuthSuccessMessage, BackpackInfoMessage, HandshakeRequest,
        InboundEnvelope, InboundKind, MarketInfoMessage, MessageType, PlayerJoinedMessage,
        PlayerLeftMessage, PlayerListMessage, RoomListMessage,
    },
    ui::state::AppState,
    usecase::JoinedRoom,
};

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

/// Why a connection was refused before its credentials were checked.
#[derive(Debug, Error)]
enum HandshakeFailure {
    #[error("no handshake frame within {0:?}")]
    Timeout(Duration),

    #[error("transport closed before the handshake")]
    Closed,

    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    #[error("handshake frame must be text")]
    Binary,

    #[error("malformed handshake frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid handshake field: {0}")]
    InvalidField(#[from] ValueObjectError),
}

impl HandshakeFailure {
    /// `auth_failed` reason, or `None` when the peer is already gone.
    fn reason(&self) -> Option<&'static str> {
        match self {
            HandshakeFailure::Timeout(_) => Some("handshake_timeout"),
            HandshakeFailure::Binary
            | HandshakeFailure::Malformed(_)
            | HandshakeFailure::InvalidField(_) => Some("invalid_request"),
            HandshakeFailure::Closed | HandshakeFailure::Transport(_) => None,
        }
    }
}

/// Why an `Active` session ended other than by a clean close.
#[derive(Debug, Error)]
enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    #[error("no frame received for {0:?}")]
    Idle(Duration),
}

/// Validated handshake request.
#[derive(Debug)]
struct Handshake {
    token: String,
    identity: Identity,
    room_id: RoomId,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let mut session = SessionState::Connecting;
    let (mut sender, mut receiver) = socket.split();
    session.advance(SessionState::Authenticating);

    // 1. ハンドシェイクの受信（最初の 1 フレームのみ）
    let handshake = match read_handshake(&mut receiver, state.session.handshake_timeout).await {
        Ok(handshake) => handshake,
        Err(failure) => {
            tracing::warn!("Handshake refused: {}", failure);
            if let Some(reason) = failure.reason() {
                reject(&mut sender, reason).await;
            }
            session.advance(SessionState::Closed);
            return;
        }
    };

    // 2. 認証と入室
    let claimed = handshake.identity.to_string();
    let (channel, rx) = outbound::channel(state.session.outbound_buffer);
    let joined = match state
        .join_room_usecase
        .execute(
            &handshake.token,
            handshake.identity,
            handshake.room_id,
            channel.clone(),
        )
        .await
    {
        Ok(joined) => joined,
        Err(e) => {
            tracing::warn!("Authentication failed for '{}': {}", claimed, e);
            reject(&mut sender, e.reason()).await;
            session.advance(SessionState::Closed);
            return;
        }
    };
    session.advance(SessionState::Joined);

    // 3. player_joined / player_list / auth_success
    if let Err(e) = announce_join(&state, &joined, &mut sender).await {
        tracing::warn!(
            "Failed to complete handshake of '{}': {}",
            joined.connection.id,
            e
        );
        session.advance(SessionState::Closed);
        channel.close();
        cleanup(&state, &joined.connection).await;
        return;
    }
    session.advance(SessionState::Active);
    tracing::info!(
        "Session '{}' of '{}' is active in room '{}'",
        joined.connection.id,
        joined.connection.identity,
        joined.room_id
    );

    // 4. 送受信ループ
    let context = SessionContext {
        state: state.clone(),
        connection: joined.connection.clone(),
        room_id: joined.room_id.clone(),
        channel: channel.clone(),
    };
    let mut send_task = pusher_loop(rx, sender, state.session.ping_interval);
    let mut recv_task = tokio::spawn(receive_loop(receiver, context));

    // If any one of the tasks completes, abort the other
    tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            match result {
                Ok(Ok(())) => tracing::info!("Client '{}' closed the connection", joined.connection.id),
                Ok(Err(e)) => tracing::info!("Session '{}' ended: {}", joined.connection.id, e),
                Err(e) => tracing::error!("Receive task of '{}' failed: {}", joined.connection.id, e),
            }
        }
        _ = &mut send_task => {
            recv_task.abort();
            tracing::info!("Outbound channel of '{}' closed", joined.connection.id);
        }
    }

    // 5. 退室
    session.advance(SessionState::Closed);
    channel.close();
    cleanup(&state, &joined.connection).await;
}

/// Wait for the first data frame and validate it as a handshake request.
async fn read_handshake(
    receiver: &mut WsStream,
    limit: Duration,
) -> Result<Handshake, HandshakeFailure> {
    let text = tokio::time::timeout(limit, next_text_frame(receiver))
        .await
        .map_err(|_| HandshakeFailure::Timeout(limit))??;
    parse_handshake(&text)
}

async fn next_text_frame(receiver: &mut WsStream) -> Result<String, HandshakeFailure> {
    loop {
        match receiver.next().await {
            None | Some(Ok(Message::Close(_))) => return Err(HandshakeFailure::Closed),
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(Message::Text(text))) => return Ok(text.to_string()),
            Some(Ok(Message::Binary(_))) => return Err(HandshakeFailure::Binary),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
        }
    }
}

fn parse_handshake(text: &str) -> Result<Handshake, HandshakeFailure> {
    let request: HandshakeRequest = serde_json::from_str(text)?;
    Ok(Handshake {
        identity: Identity::new(request.identity)?,
        room_id: RoomId::new(request.room)?,
        token: request.token,
    })
}

/// Send `auth_failed` and close. Write errors are irrelevant at this point.
async fn reject(sender: &mut WsSink, reason: &str) {
    if let Some(json) = encode(&AuthFailedMessage::new(reason)) {
        if let Err(e) = sender.send(Message::Text(json.into())).await {
            tracing::debug!("Failed to send auth_failed: {}", e);
            return;
        }
    }
    if let Err(e) = sender.send(Message::Close(None)).await {
        tracing::debug!("Failed to close rejected connection: {}", e);
    }
}

/// Lifecycle notifications of a successful join, in handshake order.
async fn announce_join(
    state: &AppState,
    joined: &JoinedRoom,
    sender: &mut WsSink,
) -> Result<(), axum::Error> {
    let id = joined.connection.id;

    // 追い出した旧セッションの player_left（新しい接続自身には送らない）
    for departure in joined.evicted.iter().filter(|d| !d.room_removed) {
        if let Some(json) = encode(&PlayerLeftMessage::from(&departure.connection)) {
            state
                .broadcast_usecase
                .execute(&departure.room_id, Some(&id), &json)
                .await;
        }
    }

    if let Some(json) = encode(&PlayerJoinedMessage::from(&joined.connection)) {
        let report = state
            .broadcast_usecase
            .execute(&joined.room_id, Some(&id), &json)
            .await;
        tracing::debug!(
            "Broadcasted player_joined for '{}' to {} members",
            id,
            report.delivered.len()
        );
    }

    if let Some(json) = encode(&PlayerListMessage::from(joined.members.as_slice())) {
        sender.send(Message::Text(json.into())).await?;
    }

    if let Some(json) = encode(&AuthSuccessMessage::default()) {
        sender.send(Message::Text(json.into())).await?;
    }

    Ok(())
}

/// Drains this connection's outbound queue into the WebSocket sink.
///
/// Ends when the queue is closed (leave, eviction, dead member) or a write
/// fails. With `ping_interval` set, a ping is written on every tick.
fn pusher_loop(
    mut rx: PusherReceiver,
    mut sender: WsSink,
    ping_interval: Option<Duration>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut heartbeat = ping_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                message = rx.recv() => {
                    let Some(text) = message else {
                        if let Err(e) = sender.send(Message::Close(None)).await {
                            tracing::debug!("Failed to send close frame: {}", e);
                        }
                        break;
                    };
                    if let Err(e) = sender.send(Message::Text(text.into())).await {
                        tracing::debug!("Failed to write to client: {}", e);
                        break;
                    }
                }
                _ = tick(&mut heartbeat) => {
                    if let Err(e) = sender.send(Message::Ping(Bytes::new())).await {
                        tracing::debug!("Failed to write ping: {}", e);
                        break;
                    }
                }
            }
        }
    })
}

async fn tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Everything the receive loop needs about its own session.
///
/// Only built once the session is `Active`, so every frame that reaches
/// [`SessionContext::dispatch`] was read after `auth_success` was written.
struct SessionContext {
    state: Arc<AppState>,
    connection: Connection,
    room_id: RoomId,
    channel: PusherChannel,
}

async fn receive_loop(mut receiver: WsStream, context: SessionContext) -> Result<(), SessionError> {
    let idle_timeout = context.state.session.idle_timeout;

    loop {
        let next = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, receiver.next())
                .await
                .map_err(|_| SessionError::Idle(limit))?,
            None => receiver.next().await,
        };

        match next {
            None | Some(Ok(Message::Close(_))) => return Ok(()),
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(Message::Text(text))) => context.dispatch(text.as_str()).await,
            Some(Ok(Message::Binary(_))) => {
                tracing::debug!("Ignoring binary frame from '{}'", context.connection.id);
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
        }
    }
}

impl SessionContext {
    /// Route one application frame by its `type`.
    async fn dispatch(&self, text: &str) {
        // 別の配信で dead member として外された後は何も中継しない
        if self.channel.is_closed() {
            tracing::debug!(
                "Discarding frame from '{}': no longer a room member",
                self.connection.id
            );
            return;
        }

        let envelope = match InboundEnvelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(
                    "Ignoring malformed frame from '{}': {}",
                    self.connection.id,
                    e
                );
                return;
            }
        };

        if self.state.session.reverify_tokens {
            if let Some(token) = envelope.token() {
                if let Err(e) = self
                    .state
                    .authenticate_usecase
                    .execute(token, &self.connection.identity)
                    .await
                {
                    tracing::warn!(
                        "Discarding frame from '{}': token re-verification failed: {}",
                        self.connection.id,
                        e
                    );
                    return;
                }
            }
        }

        match envelope.kind() {
            InboundKind::Action | InboundKind::Chat => {
                let report = self
                    .state
                    .broadcast_usecase
                    .execute(&self.room_id, Some(&self.connection.id), text)
                    .await;
                tracing::debug!(
                    "Relayed frame from '{}' to {} members ({} evicted)",
                    self.connection.id,
                    report.delivered.len(),
                    report.evicted.len()
                );
            }
            InboundKind::ListRooms => {
                let rooms = self.state.list_rooms_usecase.execute().await;
                self.reply(&RoomListMessage::from(rooms.as_slice()));
            }
            InboundKind::GetBackpack => {
                let items = self
                    .state
                    .catalog_usecase
                    .backpack(&self.connection)
                    .await;
                self.reply(&BackpackInfoMessage {
                    r#type: MessageType::BackpackInfo,
                    count: items.len(),
                    items,
                    user_id: self.connection.numeric_user_id,
                });
            }
            InboundKind::GetMarket => {
                let items = self.state.catalog_usecase.market().await;
                self.reply(&MarketInfoMessage {
                    r#type: MessageType::MarketInfo,
                    count: items.len(),
                    items,
                });
            }
            InboundKind::Unknown(kind) => {
                tracing::debug!(
                    "Ignoring frame of unknown type {:?} from '{}'",
                    kind,
                    self.connection.id
                );
            }
        }
    }

    /// Queue a response for this connection only.
    fn reply<T: Serialize>(&self, message: &T) {
        let Some(json) = encode(message) else {
            return;
        };
        if let Err(e) = self.channel.push(&json) {
            tracing::warn!("Failed to queue reply to '{}': {}", self.connection.id, e);
            self.channel.close();
        }
    }
}

/// Remove the connection from its room and tell whoever is left.
async fn cleanup(state: &AppState, connection: &Connection) {
    let Some(departure) = state.leave_room_usecase.execute(&connection.id).await else {
        // 既に dead member として外されている
        tracing::debug!("'{}' was no longer in a room", connection.id);
        return;
    };

    if let Some(json) = encode(&PlayerLeftMessage::from(&departure.connection)) {
        let report = state
            .leave_room_usecase
            .broadcast_player_left(&departure, &json)
            .await;
        tracing::debug!(
            "Broadcasted player_left for '{}' to {} members",
            connection.id,
            report.delivered.len()
        );
    }
}

fn encode<T: Serialize>(message: &T) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            None
        }
    }
}

//! WebSocket client session management.

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use jigger_server::infrastructure::dto::websocket::{
    ActionMessage, ChatMessage, HandshakeRequest, MessageType, QueryMessage,
};
use jigger_shared::time::get_timestamp;

use super::{
    domain::{ServerEvent, UserCommand},
    error::ClientError,
    formatter::MessageFormatter,
    runner::ClientConfig,
    ui::redisplay_prompt,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn connection_error(e: impl std::fmt::Display) -> ClientError {
    ClientError::ConnectionError(e.to_string())
}

/// Run one connection: handshake, then relay prompt input until either side ends
pub async fn run_client_session(config: &ClientConfig) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(config.url.as_str())
        .await
        .map_err(connection_error)?;
    let (mut write, mut read) = ws_stream.split();

    // 1. ハンドシェイク
    let request = HandshakeRequest {
        r#type: Some("auth".to_string()),
        token: config.token.clone(),
        identity: config.identity.clone(),
        room: config.room.clone(),
    };
    let json = serde_json::to_string(&request).map_err(connection_error)?;
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(connection_error)?;
    await_auth(&mut read, config).await?;

    tracing::info!("Joined room '{}' as '{}'", config.room, config.identity);
    println!(
        "\nYou are '{}' in '{}'. Type messages and press Enter to send. \
         Commands: /rooms, /backpack, /market, /action [name]. Press Ctrl+D to exit.\n",
        config.identity, config.room
    );

    // 2. 受信
    let config_for_read = config.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Some(formatted) = render(text.as_str(), &config_for_read) {
                        print!("{}", formatted);
                        redisplay_prompt(&config_for_read.identity);
                    }
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&config_for_read.identity);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    return true;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return true;
                }
                _ => {}
            }
        }
        true
    });

    // 3. 入力（rustyline は同期 API なので専用スレッドで動かす）
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt = format!("{}> ", config.identity);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // 4. 送信
    let identity = config.identity.clone();
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            let Some(command) = UserCommand::parse(&line) else {
                continue;
            };
            if let UserCommand::Unknown(name) = &command {
                print!("{}", MessageFormatter::format_unknown_command(name));
                redisplay_prompt(&identity);
                continue;
            }

            let Some(frame) = frame_for(&command, &identity) else {
                continue;
            };
            let json = match frame {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                return true;
            }
        }

        // 入力終了（Ctrl+D / Ctrl+C）
        close_quietly(&mut write).await;
        false
    });

    // If any one of the tasks completes, abort the other
    let connection_lost = tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            read_result.unwrap_or(true)
        }
        write_result = &mut write_task => {
            read_task.abort();
            write_result.unwrap_or(true)
        }
    };

    if connection_lost {
        return Err(ClientError::ConnectionError("Connection lost".to_string()));
    }
    Ok(())
}

/// Read frames until the relay answers the handshake.
async fn await_auth(
    read: &mut SplitStream<WsStream>,
    config: &ClientConfig,
) -> Result<(), ClientError> {
    while let Some(message) = read.next().await {
        let text = match message.map_err(connection_error)? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match ServerEvent::parse(text.as_str()) {
            Some(ServerEvent::AuthSuccess) => return Ok(()),
            Some(ServerEvent::AuthFailed { reason }) => {
                return Err(ClientError::AuthFailed(reason));
            }
            Some(ServerEvent::PlayerList { players }) => {
                print!(
                    "{}",
                    MessageFormatter::format_player_list(&config.room, &players, &config.identity)
                );
            }
            _ => tracing::debug!("Ignoring frame before auth_success: {}", text.as_str()),
        }
    }

    Err(ClientError::ConnectionError(
        "Connection closed during handshake".to_string(),
    ))
}

async fn close_quietly(write: &mut SplitSink<WsStream, Message>) {
    if let Err(e) = write.send(Message::Close(None)).await {
        tracing::debug!("Failed to send close frame: {}", e);
    }
}

/// Frame sent for a prompt command. `Unknown` commands are never sent.
fn frame_for(command: &UserCommand, identity: &str) -> Option<serde_json::Result<String>> {
    let frame = match command {
        UserCommand::Chat(text) => serde_json::to_string(&ChatMessage {
            r#type: MessageType::Chat,
            player_id: identity.to_string(),
            text: text.clone(),
        }),
        UserCommand::Action(action) => serde_json::to_string(&ActionMessage {
            r#type: MessageType::Action,
            player_id: identity.to_string(),
            action: action.clone(),
        }),
        UserCommand::ListRooms => query(MessageType::ListRooms),
        UserCommand::Backpack => query(MessageType::GetBackpack),
        UserCommand::Market => query(MessageType::GetMarket),
        UserCommand::Unknown(_) => return None,
    };
    Some(frame)
}

fn query(r#type: MessageType) -> serde_json::Result<String> {
    serde_json::to_string(&QueryMessage { r#type })
}

/// Text to print for a frame received while in the room.
fn render(text: &str, config: &ClientConfig) -> Option<String> {
    let Some(event) = ServerEvent::parse(text) else {
        return Some(MessageFormatter::format_raw_message(text));
    };

    let formatted = match event {
        ServerEvent::AuthSuccess | ServerEvent::AuthFailed { .. } => return None,
        ServerEvent::PlayerList { players } => {
            MessageFormatter::format_player_list(&config.room, &players, &config.identity)
        }
        ServerEvent::PlayerJoined {
            player_id,
            username,
        } => MessageFormatter::format_player_joined(&player_id, username.as_deref()),
        ServerEvent::PlayerLeft {
            player_id,
            username,
        } => MessageFormatter::format_player_left(&player_id, username.as_deref()),
        ServerEvent::Chat { player_id, text } => MessageFormatter::format_chat_message(
            player_id.as_deref(),
            text.as_deref().unwrap_or_default(),
            get_timestamp(),
        ),
        ServerEvent::Action { player_id, action } => {
            MessageFormatter::format_action(player_id.as_deref(), action.as_deref())
        }
        ServerEvent::RoomList { rooms } => MessageFormatter::format_room_list(&rooms),
        ServerEvent::BackpackInfo { items, user_id } => {
            MessageFormatter::format_backpack(&items, user_id)
        }
        ServerEvent::MarketInfo { items } => MessageFormatter::format_market(&items),
    };
    Some(formatted)
}

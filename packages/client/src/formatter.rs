//! Message formatting utilities for client display.

use jigger_server::{
    domain::{BackpackItem, MarketItem},
    infrastructure::dto::websocket::{PlayerInfo, RoomInfo},
};
use jigger_shared::time::timestamp_to_cst_rfc3339;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the `player_list` received right after joining
    ///
    /// # Arguments
    ///
    /// * `room` - The joined room
    /// * `players` - Room members in join order
    /// * `me` - The current client's identity (to mark as "me")
    pub fn format_player_list(room: &str, players: &[PlayerInfo], me: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!("Players in '{}':\n", room));

        if players.is_empty() {
            output.push_str("(No players)\n");
        } else {
            for player in players {
                let me_suffix = if player.player_id == me { " (me)" } else { "" };
                output.push_str(&format!(
                    "{}{}\n",
                    display_name(&player.player_id, player.username.as_deref()),
                    me_suffix
                ));
            }
        }

        output.push_str(&format!("{}\n", RULE));
        output
    }

    pub fn format_player_joined(player_id: &str, username: Option<&str>) -> String {
        format!("\n+ {} joined\n", display_name(player_id, username))
    }

    pub fn format_player_left(player_id: &str, username: Option<&str>) -> String {
        format!("\n- {} left\n", display_name(player_id, username))
    }

    /// Format a relayed chat message
    ///
    /// # Arguments
    ///
    /// * `from` - The sender's identity, when the frame carried one
    /// * `text` - The message text
    /// * `received_at` - Unix timestamp when the frame arrived (milliseconds)
    pub fn format_chat_message(from: Option<&str>, text: &str, received_at: i64) -> String {
        format!(
            "\n\n{rule}\n@{}: {}\nreceived at {}\n{rule}\n",
            from.unwrap_or("unknown"),
            text,
            timestamp_to_cst_rfc3339(received_at),
            rule = THIN_RULE
        )
    }

    pub fn format_action(from: Option<&str>, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("\n* {} does '{}'\n", from.unwrap_or("unknown"), action),
            None => format!("\n* {} acts\n", from.unwrap_or("unknown")),
        }
    }

    pub fn format_room_list(rooms: &[RoomInfo]) -> String {
        let mut output = format!("\n{}\nRooms:\n", RULE);
        if rooms.is_empty() {
            output.push_str("(No rooms)\n");
        }
        for room in rooms {
            output.push_str(&format!("{} ({} players)\n", room.room, room.player_count));
        }
        output.push_str(&format!("{}\n", RULE));
        output
    }

    pub fn format_backpack(items: &[BackpackItem], user_id: Option<u64>) -> String {
        let owner = user_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let mut output = format!("\n{}\nBackpack of user {} ({} items):\n", RULE, owner, items.len());
        for item in items {
            let equipped = if item.equipped { " [equipped]" } else { "" };
            output.push_str(&format!(
                "#{} {} ({}) acquired {}{}\n",
                item.id, item.name, item.kind, item.acquired_time, equipped
            ));
        }
        output.push_str(&format!("{}\n", RULE));
        output
    }

    pub fn format_market(items: &[MarketItem]) -> String {
        let mut output = format!("\n{}\nMarket ({} items):\n", RULE, items.len());
        for item in items {
            output.push_str(&format!(
                "#{} {} ({}) {} coins - {}\n",
                item.id, item.name, item.kind, item.price, item.description
            ));
        }
        output.push_str(&format!("{}\n", RULE));
        output
    }

    /// Format a local notice for a slash command the relay does not know
    pub fn format_unknown_command(name: &str) -> String {
        format!(
            "\nUnknown command '/{}'. Available: /rooms, /backpack, /market, /action [name]\n",
            name
        )
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}

fn display_name(player_id: &str, username: Option<&str>) -> String {
    match username {
        Some(name) if !name.is_empty() && name != player_id => format!("{} ({})", name, player_id),
        _ => player_id.to_string(),
    }
}

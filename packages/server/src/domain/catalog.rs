//! Inventory and market lookups answered to `get_backpack` / `get_market`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::entity::Connection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackpackItem {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub acquired_time: String,
    pub equipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketItem {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: u64,
    pub description: String,
    pub image_url: String,
}

/// Read-only catalog collaborator.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Items owned by the player behind `connection`.
    async fn backpack(&self, connection: &Connection) -> Vec<BackpackItem>;

    /// Items currently for sale.
    async fn market(&self) -> Vec<MarketItem>;
}

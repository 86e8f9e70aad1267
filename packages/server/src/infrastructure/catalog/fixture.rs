//! Static catalog seeded with the demo skins and decorations.
//!
//! There is no inventory store yet: every player owns the same backpack.

use async_trait::async_trait;

use crate::domain::{BackpackItem, Catalog, Connection, MarketItem};

pub struct StaticCatalog {
    backpack: Vec<BackpackItem>,
    market: Vec<MarketItem>,
}

impl StaticCatalog {
    pub fn new(backpack: Vec<BackpackItem>, market: Vec<MarketItem>) -> Self {
        Self { backpack, market }
    }

    /// Catalog with the built-in demo items.
    pub fn demo() -> Self {
        Self::new(demo_backpack(), demo_market())
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::demo()
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn backpack(&self, _connection: &Connection) -> Vec<BackpackItem> {
        self.backpack.clone()
    }

    async fn market(&self) -> Vec<MarketItem> {
        self.market.clone()
    }
}

fn backpack_item(id: u64, name: &str, kind: &str, acquired_time: &str, equipped: bool) -> BackpackItem {
    BackpackItem {
        id,
        name: name.to_string(),
        kind: kind.to_string(),
        acquired_time: acquired_time.to_string(),
        equipped,
    }
}

fn market_item(
    id: u64,
    name: &str,
    kind: &str,
    price: u64,
    description: &str,
    image_url: &str,
) -> MarketItem {
    MarketItem {
        id,
        name: name.to_string(),
        kind: kind.to_string(),
        price,
        description: description.to_string(),
        image_url: image_url.to_string(),
    }
}

fn demo_backpack() -> Vec<BackpackItem> {
    vec![
        backpack_item(1, "可爱小猫皮肤", "skin", "2023-01-15 10:30:00", true),
        backpack_item(2, "炫酷小狗皮肤", "skin", "2023-02-20 14:45:00", false),
        backpack_item(3, "金色边框", "decoration", "2023-03-05 09:15:00", true),
    ]
}

fn demo_market() -> Vec<MarketItem> {
    vec![
        market_item(
            101,
            "可爱小猫皮肤",
            "skin",
            100,
            "一只可爱的小猫皮肤，让你的宠物更加萌动",
            "/images/cat_skin.png",
        ),
        market_item(
            102,
            "炫酷小狗皮肤",
            "skin",
            150,
            "一只炫酷的小狗皮肤，让你的宠物更加帅气",
            "/images/dog_skin.png",
        ),
        market_item(
            201,
            "金色边框",
            "decoration",
            50,
            "金色边框装饰，让你的宠物更加耀眼",
            "/images/gold_frame.png",
        ),
        market_item(
            202,
            "银色边框",
            "decoration",
            30,
            "银色边框装饰，简约而不失优雅",
            "/images/silver_frame.png",
        ),
    ]
}

//! UseCase: 背包・商城の参照

use std::sync::Arc;

use crate::domain::{BackpackItem, Catalog, Connection, MarketItem};

/// 背包・商城参照のユースケース
pub struct CatalogUseCase {
    catalog: Arc<dyn Catalog>,
}

impl CatalogUseCase {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// 接続中のユーザーの背包
    pub async fn backpack(&self, connection: &Connection) -> Vec<BackpackItem> {
        self.catalog.backpack(connection).await
    }

    /// 商城の商品一覧
    pub async fn market(&self) -> Vec<MarketItem> {
        self.catalog.market().await
    }
}

use crate::domain::model::{BuyerId, Cart};
use crate::domain::port::{CartStore, RepositoryError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// インメモリカートストア
/// 購入者IDをキーとする明示的なストアで、セッション相当の一時状態を保持する
/// プロセス再起動で消えるが、カートは元々セッションを越えて永続化しない
#[derive(Default)]
pub struct InMemoryCartStore {
    carts: Mutex<HashMap<BuyerId, Cart>>,
}

impl InMemoryCartStore {
    /// 新しいインメモリカートストアを作成
    pub fn new() -> Self {
        Self {
            carts: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, buyer_id: BuyerId) -> Result<Cart, RepositoryError> {
        let carts = self.carts.lock().await;
        Ok(carts.get(&buyer_id).cloned().unwrap_or_default())
    }

    async fn save(&self, buyer_id: BuyerId, cart: Cart) -> Result<(), RepositoryError> {
        let mut carts = self.carts.lock().await;
        carts.insert(buyer_id, cart);
        Ok(())
    }

    async fn clear(&self, buyer_id: BuyerId) -> Result<(), RepositoryError> {
        let mut carts = self.carts.lock().await;
        carts.remove(&buyer_id);
        Ok(())
    }
}

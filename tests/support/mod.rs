// テスト用のインメモリポート実装
// 本番アダプターと同じ条件付き更新（CAS）の意味論を持たせてあり、
// 並行チェックアウトの勝敗が決定的に検証できる

#![allow(dead_code)]

use bookstore_checkout::domain::event::DomainEvent;
use bookstore_checkout::domain::model::{
    BookId, BuyerId, CatalogBook, Coupon, CouponId, Order, OrderId, OrderStatus,
};
use bookstore_checkout::domain::port::{
    CatalogReader, CouponLedger, EventPublisher, Logger, OrderRepository, PublisherError,
    RepositoryError, StockLedger,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// テスト用のカタログリーダー
pub struct MockCatalogReader {
    books: Arc<Mutex<HashMap<BookId, CatalogBook>>>,
}

impl MockCatalogReader {
    pub fn new() -> Self {
        Self {
            books: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn add_book(&self, book: CatalogBook) {
        let mut books = self.books.lock().await;
        books.insert(book.id, book);
    }

    /// カタログ上の在庫表示を変更する（参考値チェックの検証用）
    pub async fn set_stock(&self, book_id: BookId, stock: u32) {
        let mut books = self.books.lock().await;
        if let Some(book) = books.get_mut(&book_id) {
            book.stock = stock;
        }
    }

    /// 承認状態を変更する（確定時の再検証の検証用）
    pub async fn set_approved(&self, book_id: BookId, approved: bool) {
        let mut books = self.books.lock().await;
        if let Some(book) = books.get_mut(&book_id) {
            book.approved = approved;
        }
    }
}

#[async_trait]
impl CatalogReader for MockCatalogReader {
    async fn get_book(&self, book_id: BookId) -> Result<Option<CatalogBook>, RepositoryError> {
        let books = self.books.lock().await;
        Ok(books.get(&book_id).cloned())
    }
}

/// テスト用の在庫台帳
/// ロック内で判定と減算を同時に行い、本番の条件付きUPDATEと同じ意味論を持つ
pub struct InMemoryStockLedger {
    stocks: Arc<Mutex<HashMap<BookId, u32>>>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self {
            stocks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn set_stock(&self, book_id: BookId, stock: u32) {
        let mut stocks = self.stocks.lock().await;
        stocks.insert(book_id, stock);
    }

    pub async fn stock_of(&self, book_id: BookId) -> u32 {
        let stocks = self.stocks.lock().await;
        *stocks.get(&book_id).unwrap_or(&0)
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn reserve_and_decrement(
        &self,
        book_id: BookId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let mut stocks = self.stocks.lock().await;
        match stocks.get_mut(&book_id) {
            Some(stock) if *stock >= quantity => {
                *stock -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restock(&self, book_id: BookId, quantity: u32) -> Result<(), RepositoryError> {
        let mut stocks = self.stocks.lock().await;
        let stock = stocks.entry(book_id).or_insert(0);
        *stock += quantity;
        Ok(())
    }
}

/// 一度だけ一時的なエラーを返す在庫台帳
/// コーディネーターの限定的な再試行の検証用
pub struct FlakyStockLedger {
    inner: Arc<InMemoryStockLedger>,
    failures_remaining: Arc<Mutex<u32>>,
}

impl FlakyStockLedger {
    pub fn new(inner: Arc<InMemoryStockLedger>, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: Arc::new(Mutex::new(failures)),
        }
    }
}

#[async_trait]
impl StockLedger for FlakyStockLedger {
    async fn reserve_and_decrement(
        &self,
        book_id: BookId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        {
            let mut remaining = self.failures_remaining.lock().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RepositoryError::Transient(
                    "lock wait timeout (simulated)".to_string(),
                ));
            }
        }
        self.inner.reserve_and_decrement(book_id, quantity).await
    }

    async fn restock(&self, book_id: BookId, quantity: u32) -> Result<(), RepositoryError> {
        self.inner.restock(book_id, quantity).await
    }
}

struct StoredCoupon {
    coupon: Coupon,
    times_used: u32,
}

/// テスト用のクーポン台帳
/// 消費はロック内の上限チェック+インクリメントで、本番のCASと同じ意味論
pub struct InMemoryCouponLedger {
    coupons: Arc<Mutex<HashMap<CouponId, StoredCoupon>>>,
    usages: Arc<Mutex<Vec<(CouponId, BuyerId)>>>,
}

impl InMemoryCouponLedger {
    pub fn new() -> Self {
        Self {
            coupons: Arc::new(Mutex::new(HashMap::new())),
            usages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn add_coupon(&self, coupon: Coupon) {
        let mut coupons = self.coupons.lock().await;
        let times_used = coupon.times_used();
        coupons.insert(coupon.id(), StoredCoupon { coupon, times_used });
    }

    pub async fn times_used(&self, coupon_id: CouponId) -> u32 {
        let coupons = self.coupons.lock().await;
        coupons.get(&coupon_id).map_or(0, |c| c.times_used)
    }

    pub async fn usage_count(&self, coupon_id: CouponId) -> usize {
        let usages = self.usages.lock().await;
        usages.iter().filter(|(id, _)| *id == coupon_id).count()
    }

    /// クーポンを無効化する（割引凍結の検証用）
    pub async fn deactivate(&self, coupon_id: CouponId) {
        let mut coupons = self.coupons.lock().await;
        if let Some(stored) = coupons.get_mut(&coupon_id) {
            let c = &stored.coupon;
            stored.coupon = Coupon::reconstruct(
                c.id(),
                c.code().to_string(),
                c.coupon_type(),
                c.amount(),
                c.min_order_amount(),
                c.usage_limit(),
                stored.times_used,
                false,
                c.starts_at(),
                c.expires_at(),
            );
        }
    }
}

#[async_trait]
impl CouponLedger for InMemoryCouponLedger {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupons = self.coupons.lock().await;
        let found = coupons.values().find(|stored| {
            stored.coupon.code().eq_ignore_ascii_case(code.trim())
        });
        Ok(found.map(|stored| {
            let c = &stored.coupon;
            Coupon::reconstruct(
                c.id(),
                c.code().to_string(),
                c.coupon_type(),
                c.amount(),
                c.min_order_amount(),
                c.usage_limit(),
                stored.times_used,
                c.active(),
                c.starts_at(),
                c.expires_at(),
            )
        }))
    }

    async fn redeem(
        &self,
        coupon_id: CouponId,
        buyer_id: BuyerId,
    ) -> Result<bool, RepositoryError> {
        let mut coupons = self.coupons.lock().await;
        let stored = coupons.get_mut(&coupon_id).ok_or_else(|| {
            RepositoryError::OperationFailed(format!(
                "クーポンが見つかりません: {}",
                coupon_id
            ))
        })?;

        match stored.coupon.usage_limit() {
            Some(limit) if stored.times_used >= limit => Ok(false),
            _ => {
                stored.times_used += 1;
                let mut usages = self.usages.lock().await;
                usages.push((coupon_id, buyer_id));
                Ok(true)
            }
        }
    }
}

/// テスト用の注文リポジトリ
pub struct InMemoryOrderRepository {
    orders: Arc<Mutex<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn count(&self) -> usize {
        let orders = self.orders.lock().await;
        orders.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.lock().await;
        if orders.contains_key(&order.id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "注文は既に存在します: {}",
                order.id()
            )));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.lock().await;
        Ok(orders.get(&order_id).cloned())
    }

    async fn find_by_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.lock().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|order| order.buyer_id() == buyer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.order_date().cmp(&a.order_date()));
        Ok(result)
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.lock().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|order| order.status() == status)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.order_date().cmp(&a.order_date()));
        Ok(result)
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.lock().await;
        let mut result: Vec<Order> = orders.values().cloned().collect();
        result.sort_by(|a, b| b.order_date().cmp(&a.order_date()));
        Ok(result)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.lock().await;
        match orders.get_mut(&order_id) {
            Some(order) if order.status() == expected => {
                // ロック内で期待値を確認してから書き換える（本番のCASと同じ意味論）
                let mut updated = order.clone();
                let result = if next == OrderStatus::Cancelled {
                    updated.cancel()
                } else {
                    updated.advance(next)
                };
                match result {
                    Ok(()) => {
                        *order = updated;
                        Ok(true)
                    }
                    Err(_) => Ok(false),
                }
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let mut orders = self.orders.lock().await;
        orders.remove(&order_id);
        Ok(())
    }

    async fn increment_digital_downloads(
        &self,
        order_id: OrderId,
        book_id: BookId,
    ) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.lock().await;
        match orders.get_mut(&order_id) {
            Some(order) => Ok(order.record_download(book_id).is_ok()),
            None => Ok(false),
        }
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

/// 発行されたイベントを記録するイベント発行者
#[derive(Default)]
pub struct CollectingEventPublisher {
    events: std::sync::Mutex<Vec<DomainEvent>>,
}

impl CollectingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventPublisher for CollectingEventPublisher {
    fn publish(&self, event: &DomainEvent) -> Result<(), PublisherError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// 何も出力しないロガー
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    fn info(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    fn warn(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    fn error(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
}

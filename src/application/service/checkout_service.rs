use crate::application::ApplicationError;
use crate::domain::error::{CouponError, DomainError};
use crate::domain::event::{DomainEvent, OrderPlaced};
use crate::domain::model::{
    BookId, BuyerId, DiscountQuote, Order, PaymentMethod, PaymentStatus, ShippingAddress,
};
use crate::domain::port::{
    CartStore, CatalogReader, CouponLedger, EventPublisher, Logger, OrderRepository, StockLedger,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 一時的なストレージ障害に対する最大試行回数
/// 業務上の失敗（在庫不足・クーポン上限など）は再試行しない
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// チェックアウトアプリケーションサービス
/// カートスナップショット → 割引見積もり → 在庫減算 → 注文永続化 →
/// クーポン消費を1つの確定単位として調停する
///
/// 原子性は各台帳の条件付き更新と、失敗時にこのサービスが行う補償
/// （適用済み減算の返却・注文の削除）の組み合わせで保証する。
/// 失敗のいかんに関わらず、確定が完了するまでカートには触れない
pub struct CheckoutService {
    cart_store: Arc<dyn CartStore>,
    catalog_reader: Arc<dyn CatalogReader>,
    coupon_ledger: Arc<dyn CouponLedger>,
    stock_ledger: Arc<dyn StockLedger>,
    order_repository: Arc<dyn OrderRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    logger: Arc<dyn Logger>,
}

impl CheckoutService {
    /// 新しいチェックアウトサービスを作成
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cart_store: Arc<dyn CartStore>,
        catalog_reader: Arc<dyn CatalogReader>,
        coupon_ledger: Arc<dyn CouponLedger>,
        stock_ledger: Arc<dyn StockLedger>,
        order_repository: Arc<dyn OrderRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            cart_store,
            catalog_reader,
            coupon_ledger,
            stock_ledger,
            order_repository,
            event_publisher,
            logger,
        }
    }

    /// カートをチェックアウトして注文を確定する
    ///
    /// 1. カートスナップショットから小計を再計算する（クライアント提示値は信用しない）
    /// 2. クーポンコードがあれば見積もり、割引額をこの時点で凍結する
    /// 3. 各物理明細について在庫を条件付きで減算する（失敗時は適用済み分を返却）
    /// 4. 注文と明細を永続化する（割引額・単価はスナップショット）
    /// 5. クーポンの使用回数を原子的に消費する（競り負けたら全体を取り消す）
    /// 6. 成功時にのみカートを破棄する
    ///
    /// # Arguments
    /// * `buyer_id` - 購入者ID
    /// * `coupon_code` - 適用するクーポンコード（任意）
    /// * `shipping_address` - 配送先住所
    /// * `payment_method` - 決済方法の文字列表現
    ///
    /// # Returns
    /// * `Ok(Order)` - 確定した注文
    /// * `Err(ApplicationError)` - 確定失敗（カートは保持される）
    pub async fn checkout(
        &self,
        buyer_id: BuyerId,
        coupon_code: Option<&str>,
        shipping_address: String,
        payment_method: &str,
    ) -> Result<Order, ApplicationError> {
        let correlation_id = Uuid::new_v4();

        let shipping_address = ShippingAddress::new(shipping_address)?;
        let payment_method = PaymentMethod::from_string(payment_method)?;

        let cart = self.cart_store.load(buyer_id).await?;
        let snapshot = cart.snapshot();
        if snapshot.is_empty() {
            return Err(DomainError::EmptyCart.into());
        }

        // 小計は常に明細から再計算する
        let subtotal = snapshot.subtotal();

        // クーポンの見積もり。ここで確定した割引額が注文に凍結される
        let quote = match coupon_code {
            Some(code) => Some(self.quote_coupon(code, subtotal).await?),
            None => None,
        };

        // 確定時の再検証: カート追加後に未承認へ変わった書籍を拒否する
        self.verify_books_available(&snapshot).await?;

        // 決済は模擬であり常に成功する
        let payment_status = PaymentStatus::Completed;

        let order_id = self.order_repository.next_identity();
        let order = Order::place(
            order_id,
            buyer_id,
            &snapshot,
            quote,
            shipping_address,
            payment_method,
            payment_status,
        )?;

        self.logger.info(
            "CheckoutService",
            "チェックアウトを開始します",
            Some(correlation_id),
            Some(HashMap::from([
                ("order_id".to_string(), order.id().to_string()),
                ("buyer_id".to_string(), buyer_id.to_string()),
                ("subtotal".to_string(), subtotal.amount().to_string()),
                (
                    "discount".to_string(),
                    order.discount_amount().amount().to_string(),
                ),
            ])),
        );

        // 一時的なストレージ障害のみ限定回数だけ再試行する
        let mut attempt = 1;
        loop {
            match self.try_commit(&order, correlation_id).await {
                Ok(()) => break,
                Err(ApplicationError::RepositoryError(err))
                    if err.is_transient() && attempt < MAX_COMMIT_ATTEMPTS =>
                {
                    self.logger.warn(
                        "CheckoutService",
                        &format!("一時的な障害のため再試行します: {}", err),
                        Some(correlation_id),
                        Some(HashMap::from([(
                            "attempt".to_string(),
                            attempt.to_string(),
                        )])),
                    );
                    attempt += 1;
                }
                Err(err) => {
                    self.logger.warn(
                        "CheckoutService",
                        &format!("チェックアウトを中断しました: {}", err),
                        Some(correlation_id),
                        None,
                    );
                    return Err(err);
                }
            }
        }

        // 確定に成功した場合にのみカートを破棄する
        self.cart_store.clear(buyer_id).await?;

        let event = OrderPlaced::new(
            order.id(),
            buyer_id,
            order.total_amount(),
            order.discount_amount(),
        );
        if let Err(err) = self.event_publisher.publish(&DomainEvent::OrderPlaced(event)) {
            // 注文は確定済みのため、発行失敗はログに留める
            self.logger.error(
                "CheckoutService",
                &format!("イベント発行に失敗しました: {}", err),
                Some(correlation_id),
                None,
            );
        }

        self.logger.info(
            "CheckoutService",
            "チェックアウトが完了しました",
            Some(correlation_id),
            Some(HashMap::from([
                ("order_id".to_string(), order.id().to_string()),
                (
                    "total".to_string(),
                    order.total_amount().amount().to_string(),
                ),
            ])),
        );

        Ok(order)
    }

    /// クーポンコードを検索して見積もる
    async fn quote_coupon(
        &self,
        code: &str,
        subtotal: crate::domain::model::Money,
    ) -> Result<DiscountQuote, ApplicationError> {
        let coupon = self
            .coupon_ledger
            .find_by_code(code)
            .await?
            .ok_or(ApplicationError::CouponError(CouponError::NotFound))?;
        coupon
            .quote(subtotal, Utc::now())
            .map_err(ApplicationError::CouponError)
    }

    /// 全明細の書籍が確定時点でも購入可能であることを検証する
    async fn verify_books_available(
        &self,
        snapshot: &crate::domain::model::CartSnapshot,
    ) -> Result<(), ApplicationError> {
        for line in snapshot.lines() {
            let book = self
                .catalog_reader
                .get_book(line.book_id())
                .await?
                .ok_or_else(|| {
                    ApplicationError::NotFound(format!(
                        "書籍が見つかりません: {}",
                        line.book_id()
                    ))
                })?;
            if !book.approved {
                return Err(DomainError::BookNotAvailable(book.title).into());
            }
        }
        Ok(())
    }

    /// 確定の1回分の試行
    /// 在庫減算 → 注文挿入 → クーポン消費の順に進み、途中で失敗した場合は
    /// この試行で適用した効果をすべて取り消してからエラーを返す
    async fn try_commit(
        &self,
        order: &Order,
        correlation_id: Uuid,
    ) -> Result<(), ApplicationError> {
        // 物理明細の在庫を書籍ごとに条件付きで減算する
        // 条件付き更新が正であり、ここでの失敗が確定的な在庫不足を意味する
        let mut decremented: Vec<(BookId, u32)> = Vec::new();
        for (book_id, quantity) in order.restockable_quantities() {
            match self
                .stock_ledger
                .reserve_and_decrement(book_id, quantity)
                .await
            {
                Ok(true) => decremented.push((book_id, quantity)),
                Ok(false) => {
                    self.release_decrements(&decremented, correlation_id).await;
                    return Err(DomainError::InsufficientStock(book_id).into());
                }
                Err(err) => {
                    self.release_decrements(&decremented, correlation_id).await;
                    return Err(ApplicationError::RepositoryError(err));
                }
            }
        }

        // 注文と明細を1つのトランザクションで挿入する
        if let Err(err) = self.order_repository.insert(order).await {
            self.release_decrements(&decremented, correlation_id).await;
            return Err(ApplicationError::RepositoryError(err));
        }

        // クーポンの使用回数を原子的に消費する
        // 競り負けた場合、裏付けのない割引を持つ注文を残してはならない
        if let Some(coupon_id) = order.coupon_id() {
            match self.coupon_ledger.redeem(coupon_id, order.buyer_id()).await {
                Ok(true) => {}
                Ok(false) => {
                    self.delete_order(order, correlation_id).await;
                    self.release_decrements(&decremented, correlation_id).await;
                    return Err(ApplicationError::CouponError(CouponError::Exhausted));
                }
                Err(err) => {
                    self.delete_order(order, correlation_id).await;
                    self.release_decrements(&decremented, correlation_id).await;
                    return Err(ApplicationError::RepositoryError(err));
                }
            }
        }

        Ok(())
    }

    /// この試行で適用した在庫減算を返却する
    async fn release_decrements(&self, decremented: &[(BookId, u32)], correlation_id: Uuid) {
        for (book_id, quantity) in decremented {
            if let Err(err) = self.stock_ledger.restock(*book_id, *quantity).await {
                self.logger.error(
                    "CheckoutService",
                    &format!("補償の在庫返却に失敗しました: {} ({})", book_id, err),
                    Some(correlation_id),
                    None,
                );
            }
        }
    }

    /// この試行で挿入した注文を削除する
    async fn delete_order(&self, order: &Order, correlation_id: Uuid) {
        if let Err(err) = self.order_repository.delete(order.id()).await {
            self.logger.error(
                "CheckoutService",
                &format!("補償の注文削除に失敗しました: {} ({})", order.id(), err),
                Some(correlation_id),
                None,
            );
        }
    }
}

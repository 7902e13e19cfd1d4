use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::event::{DomainEvent, OrderCancelled, OrderStatusChanged};
use crate::domain::model::{BookId, BuyerId, Order, OrderId, OrderStatus};
use crate::domain::port::{EventPublisher, Logger, OrderRepository, StockLedger};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 注文アプリケーションサービス
/// ステータス遷移と、キャンセルに伴う在庫返却を担当する
///
/// 同じ注文に対するキャンセルと前進の競合は、期待ステータス付きの
/// 条件付き更新（CAS）で直列化する。競り負けた側はエラーになる
pub struct OrderService {
    order_repository: Arc<dyn OrderRepository>,
    stock_ledger: Arc<dyn StockLedger>,
    event_publisher: Arc<dyn EventPublisher>,
    logger: Arc<dyn Logger>,
}

impl OrderService {
    /// 新しい注文サービスを作成
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        stock_ledger: Arc<dyn StockLedger>,
        event_publisher: Arc<dyn EventPublisher>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            order_repository,
            stock_ledger,
            event_publisher,
            logger,
        }
    }

    /// 注文をキャンセルする
    /// pending / processing の注文のみキャンセルでき、成功時には
    /// 物理明細の在庫を元の数量どおり返却する（書籍ごとに合算して一度だけ）
    /// 電子版の明細は在庫もダウンロード記録も変更しない
    ///
    /// # Arguments
    /// * `order_id` - 注文ID
    ///
    /// # Returns
    /// * `Ok(())` - キャンセル成功
    /// * `Err(ApplicationError)` - キャンセル失敗
    pub async fn cancel(&self, order_id: OrderId) -> Result<(), ApplicationError> {
        let correlation_id = Uuid::new_v4();

        let mut order = self
            .order_repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id))
            })?;

        let previous = order.status();
        order.cancel()?;

        // 期待ステータス付きの条件付き更新。二重キャンセルや前進との競合は
        // ここで検出され、二重の在庫返却は起こらない
        let updated = self
            .order_repository
            .update_status(order_id, previous, OrderStatus::Cancelled)
            .await?;
        if !updated {
            return Err(DomainError::NotCancellable(format!(
                "注文の状態が並行して変更されました: {}",
                order_id
            ))
            .into());
        }

        let restocked = order.restockable_quantities();
        for (book_id, quantity) in &restocked {
            self.stock_ledger.restock(*book_id, *quantity).await?;
        }

        self.logger.info(
            "OrderService",
            "注文をキャンセルしました",
            Some(correlation_id),
            Some(HashMap::from([
                ("order_id".to_string(), order_id.to_string()),
                ("restocked_books".to_string(), restocked.len().to_string()),
            ])),
        );

        let event = OrderCancelled::new(order_id, order.buyer_id(), restocked);
        if let Err(err) = self
            .event_publisher
            .publish(&DomainEvent::OrderCancelled(event))
        {
            self.logger.error(
                "OrderService",
                &format!("イベント発行に失敗しました: {}", err),
                Some(correlation_id),
                None,
            );
        }

        Ok(())
    }

    /// 注文ステータスを前進させる
    /// pending → processing → shipped → delivered のチェーンに沿った
    /// 一段階の遷移のみ許可する
    ///
    /// # Arguments
    /// * `order_id` - 注文ID
    /// * `next_status` - 遷移先ステータスの文字列表現
    pub async fn advance(
        &self,
        order_id: OrderId,
        next_status: &str,
    ) -> Result<(), ApplicationError> {
        let next = OrderStatus::from_string(next_status)?;

        let mut order = self
            .order_repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id))
            })?;

        let previous = order.status();
        order.advance(next)?;

        let updated = self
            .order_repository
            .update_status(order_id, previous, next)
            .await?;
        if !updated {
            return Err(DomainError::InvalidTransition {
                from: previous.to_string(),
                to: next.to_string(),
            }
            .into());
        }

        let event = OrderStatusChanged::new(order_id, previous, next);
        if let Err(err) = self
            .event_publisher
            .publish(&DomainEvent::OrderStatusChanged(event))
        {
            self.logger.error(
                "OrderService",
                &format!("イベント発行に失敗しました: {}", err),
                None,
                None,
            );
        }

        Ok(())
    }

    /// 電子版明細のダウンロードを記録する
    ///
    /// # Arguments
    /// * `order_id` - 注文ID
    /// * `book_id` - 書籍ID
    pub async fn record_download(
        &self,
        order_id: OrderId,
        book_id: BookId,
    ) -> Result<(), ApplicationError> {
        let mut order = self
            .order_repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id))
            })?;

        // ドメイン検証（電子版の明細であること）を先に通す
        order.record_download(book_id)?;

        let recorded = self
            .order_repository
            .increment_digital_downloads(order_id, book_id)
            .await?;
        if !recorded {
            return Err(ApplicationError::NotFound(format!(
                "電子版の明細が見つかりません: {}",
                book_id
            )));
        }

        Ok(())
    }

    /// 注文IDで注文を取得
    pub async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, ApplicationError> {
        self.order_repository
            .find_by_id(id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 購入者の注文を取得
    /// 注文日時の降順で並べて返す
    pub async fn get_orders_by_buyer(
        &self,
        buyer_id: BuyerId,
    ) -> Result<Vec<Order>, ApplicationError> {
        self.order_repository
            .find_by_buyer(buyer_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 指定されたステータス文字列の注文を取得
    /// 注文日時の降順で並べて返す
    pub async fn get_orders_by_status_string(
        &self,
        status_str: &str,
    ) -> Result<Vec<Order>, ApplicationError> {
        let status = OrderStatus::from_string(status_str)?;
        self.order_repository
            .find_by_status(status)
            .await
            .map_err(ApplicationError::from)
    }

    /// すべての注文を取得
    /// 注文日時の降順で並べて返す
    pub async fn get_all_orders(&self) -> Result<Vec<Order>, ApplicationError> {
        self.order_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}

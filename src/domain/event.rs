use crate::domain::model::{BookId, BuyerId, Money, OrderId, OrderStatus};
use chrono::{DateTime, Utc};

/// ドメインイベント列挙型
/// ビジネス上の重要なイベントを表現する
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// 注文が確定された
    OrderPlaced(OrderPlaced),
    /// 注文がキャンセルされた
    OrderCancelled(OrderCancelled),
    /// 注文ステータスが変更された
    OrderStatusChanged(OrderStatusChanged),
}

/// 注文確定イベント
#[derive(Debug, Clone)]
pub struct OrderPlaced {
    /// 注文ID
    pub order_id: OrderId,
    /// 購入者ID
    pub buyer_id: BuyerId,
    /// 合計金額（割引適用後）
    pub total_amount: Money,
    /// 凍結された割引額
    pub discount_amount: Money,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl OrderPlaced {
    /// 新しい注文確定イベントを作成
    pub fn new(
        order_id: OrderId,
        buyer_id: BuyerId,
        total_amount: Money,
        discount_amount: Money,
    ) -> Self {
        Self {
            order_id,
            buyer_id,
            total_amount,
            discount_amount,
            occurred_at: Utc::now(),
        }
    }
}

/// 注文キャンセルイベント
#[derive(Debug, Clone)]
pub struct OrderCancelled {
    /// 注文ID
    pub order_id: OrderId,
    /// 購入者ID
    pub buyer_id: BuyerId,
    /// 返却された在庫（書籍IDと数量、物理明細のみ）
    pub restocked: Vec<(BookId, u32)>,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl OrderCancelled {
    /// 新しい注文キャンセルイベントを作成
    pub fn new(order_id: OrderId, buyer_id: BuyerId, restocked: Vec<(BookId, u32)>) -> Self {
        Self {
            order_id,
            buyer_id,
            restocked,
            occurred_at: Utc::now(),
        }
    }
}

/// 注文ステータス変更イベント
#[derive(Debug, Clone)]
pub struct OrderStatusChanged {
    /// 注文ID
    pub order_id: OrderId,
    /// 遷移前のステータス
    pub from: OrderStatus,
    /// 遷移後のステータス
    pub to: OrderStatus,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl OrderStatusChanged {
    /// 新しいステータス変更イベントを作成
    pub fn new(order_id: OrderId, from: OrderStatus, to: OrderStatus) -> Self {
        Self {
            order_id,
            from,
            to,
            occurred_at: Utc::now(),
        }
    }
}

use crate::domain::event::DomainEvent;
use crate::domain::port::{EventPublisher, PublisherError};

/// コンソールイベント発行者
/// ドメインイベントをコンソールに出力する
pub struct ConsoleEventPublisher;

impl ConsoleEventPublisher {
    /// 新しいコンソールイベント発行者を作成
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for ConsoleEventPublisher {
    fn publish(&self, event: &DomainEvent) -> Result<(), PublisherError> {
        match event {
            DomainEvent::OrderPlaced(e) => {
                println!("📦 [イベント] 注文確定");
                println!("  注文ID: {}", e.order_id);
                println!("  購入者ID: {}", e.buyer_id);
                println!("  割引額: {}セント", e.discount_amount.amount());
                println!("  合計金額: {}セント", e.total_amount.amount());
                println!("  発生日時: {}", e.occurred_at.format("%Y-%m-%d %H:%M:%S"));
            }
            DomainEvent::OrderCancelled(e) => {
                println!("❌ [イベント] 注文キャンセル");
                println!("  注文ID: {}", e.order_id);
                println!("  購入者ID: {}", e.buyer_id);
                if e.restocked.is_empty() {
                    println!("  在庫返却: なし（電子版のみ）");
                } else {
                    for (book_id, quantity) in &e.restocked {
                        println!("  在庫返却: {} x{}", book_id, quantity);
                    }
                }
                println!("  発生日時: {}", e.occurred_at.format("%Y-%m-%d %H:%M:%S"));
            }
            DomainEvent::OrderStatusChanged(e) => {
                println!("🚚 [イベント] 注文ステータス変更");
                println!("  注文ID: {}", e.order_id);
                println!("  遷移: {} → {}", e.from, e.to);
                println!("  発生日時: {}", e.occurred_at.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        println!(); // 空行を追加
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{OrderCancelled, OrderPlaced, OrderStatusChanged};
    use crate::domain::model::{BookId, BuyerId, Money, OrderId, OrderStatus};

    #[test]
    fn test_publish_order_placed() {
        let publisher = ConsoleEventPublisher::new();
        let event = OrderPlaced::new(
            OrderId::new(),
            BuyerId::new(),
            Money::usd(4500),
            Money::usd(500),
        );
        let result = publisher.publish(&DomainEvent::OrderPlaced(event));
        assert!(result.is_ok());
    }

    #[test]
    fn test_publish_order_cancelled() {
        let publisher = ConsoleEventPublisher::new();
        let event = OrderCancelled::new(
            OrderId::new(),
            BuyerId::new(),
            vec![(BookId::new(), 2)],
        );
        let result = publisher.publish(&DomainEvent::OrderCancelled(event));
        assert!(result.is_ok());
    }

    #[test]
    fn test_publish_status_changed() {
        let publisher = ConsoleEventPublisher::new();
        let event = OrderStatusChanged::new(
            OrderId::new(),
            OrderStatus::Pending,
            OrderStatus::Processing,
        );
        let result = publisher.publish(&DomainEvent::OrderStatusChanged(event));
        assert!(result.is_ok());
    }
}

use crate::domain::error::DomainError;
use crate::domain::model::{
    BookId, BuyerId, CartSnapshot, CouponId, DiscountQuote, Money, OrderId, OrderStatus,
    PaymentMethod, PaymentStatus, ShippingAddress,
};
use chrono::{DateTime, Utc};

/// 注文明細
/// 価格と数量は注文確定時点のスナップショットで、作成後は不変
/// digital_downloads のみ電子版のダウンロード記録として増加する
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    book_id: BookId,
    quantity: u32,
    price: Money,
    is_digital: bool,
    digital_downloads: u32,
}

impl OrderItem {
    /// 新しい注文明細を作成
    /// 数量は1以上である必要がある
    pub fn new(
        book_id: BookId,
        quantity: u32,
        price: Money,
        is_digital: bool,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            book_id,
            quantity,
            price,
            is_digital,
            digital_downloads: 0,
        })
    }

    /// データベースから取得したデータで注文明細を再構築
    pub fn reconstruct(
        book_id: BookId,
        quantity: u32,
        price: Money,
        is_digital: bool,
        digital_downloads: u32,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            book_id,
            quantity,
            price,
            is_digital,
            digital_downloads,
        })
    }

    /// 書籍IDを取得
    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    /// 数量を取得
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 単価スナップショットを取得
    pub fn price(&self) -> Money {
        self.price
    }

    /// 電子版の購入かどうか
    pub fn is_digital(&self) -> bool {
        self.is_digital
    }

    /// ダウンロード回数を取得
    pub fn digital_downloads(&self) -> u32 {
        self.digital_downloads
    }

    /// 小計を計算（単価 × 数量）
    pub fn subtotal(&self) -> Money {
        self.price.multiply(self.quantity)
    }

    /// ダウンロードを記録する
    /// 電子版の明細でのみ許可される
    pub fn record_download(&mut self) -> Result<u32, DomainError> {
        if !self.is_digital {
            return Err(DomainError::InvalidValue(
                "物理版の明細にはダウンロードを記録できません".to_string(),
            ));
        }
        self.digital_downloads += 1;
        Ok(self.digital_downloads)
    }
}

/// 注文集約
/// 確定時にカートスナップショットから一度だけ作成され、
/// 以後はステータス遷移とダウンロード記録を除いて不変
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    buyer_id: BuyerId,
    order_date: DateTime<Utc>,
    items: Vec<OrderItem>,
    discount_amount: Money,
    total_amount: Money,
    coupon_id: Option<CouponId>,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    shipping_address: ShippingAddress,
    status: OrderStatus,
}

impl Order {
    /// カートスナップショットから注文を作成
    /// 小計は明細から再計算し、割引額はこの時点で凍結する
    /// 合計 = 小計 − 割引（ゼロ未満にはならない）
    pub fn place(
        id: OrderId,
        buyer_id: BuyerId,
        snapshot: &CartSnapshot,
        quote: Option<DiscountQuote>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        payment_status: PaymentStatus,
    ) -> Result<Self, DomainError> {
        if snapshot.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let mut items = Vec::with_capacity(snapshot.lines().len());
        for line in snapshot.lines() {
            let item = OrderItem::new(
                line.book_id(),
                line.quantity(),
                line.unit_price(),
                line.is_digital(),
            )?;
            items.push(item);
        }

        let subtotal = snapshot.subtotal();
        let discount_amount = match &quote {
            Some(quote) => quote.discount,
            None => Money::zero(),
        };
        let total_amount = subtotal.subtract_to_zero(&discount_amount)?;

        Ok(Self {
            id,
            buyer_id,
            order_date: Utc::now(),
            items,
            discount_amount,
            total_amount,
            coupon_id: quote.map(|q| q.coupon_id),
            payment_method,
            payment_status,
            shipping_address,
            status: OrderStatus::Pending,
        })
    }

    /// データベースから取得したデータで注文を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: OrderId,
        buyer_id: BuyerId,
        order_date: DateTime<Utc>,
        items: Vec<OrderItem>,
        discount_amount: Money,
        total_amount: Money,
        coupon_id: Option<CouponId>,
        payment_method: PaymentMethod,
        payment_status: PaymentStatus,
        shipping_address: ShippingAddress,
        status: OrderStatus,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::OrderValidation(
                "注文明細が空の注文は再構築できません".to_string(),
            ));
        }
        Ok(Self {
            id,
            buyer_id,
            order_date,
            items,
            discount_amount,
            total_amount,
            coupon_id,
            payment_method,
            payment_status,
            shipping_address,
            status,
        })
    }

    /// 注文IDを取得
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// 購入者IDを取得
    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }

    /// 注文日時を取得
    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    /// 注文明細のリストを取得
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// 凍結済みの割引額を取得
    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    /// 合計金額を取得
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// 適用されたクーポンIDを取得
    pub fn coupon_id(&self) -> Option<CouponId> {
        self.coupon_id
    }

    /// 決済方法を取得
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// 決済ステータスを取得
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// 配送先住所を取得
    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    /// 注文ステータスを取得
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// 小計を明細から再計算する
    /// 監査のため保存値ではなく常に導出する
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .map(|item| item.subtotal())
            .fold(Money::zero(), |acc, amount| acc.add(&amount).unwrap_or(acc))
    }

    /// 注文をキャンセルする
    /// pending / processing からのみ遷移できる
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if !self.status.is_cancellable() {
            return Err(DomainError::NotCancellable(format!(
                "{} 状態の注文はキャンセルできません",
                self.status
            )));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// 注文ステータスを前進させる
    /// pending → processing → shipped → delivered のチェーンに沿った
    /// 一段階の遷移のみ許可する。キャンセルは cancel() を使うこと
    pub fn advance(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        if next == OrderStatus::Cancelled || !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// キャンセル時に返却すべき在庫数を書籍ごとに集計する
    /// 物理明細のみが対象で、同じ書籍が複数明細に現れる場合は合算する
    /// 電子版の明細は在庫を持たないため含まれない
    pub fn restockable_quantities(&self) -> Vec<(BookId, u32)> {
        let mut quantities: Vec<(BookId, u32)> = Vec::new();
        for item in self.items.iter().filter(|item| !item.is_digital()) {
            match quantities.iter_mut().find(|(id, _)| *id == item.book_id()) {
                Some((_, qty)) => *qty += item.quantity(),
                None => quantities.push((item.book_id(), item.quantity())),
            }
        }
        quantities
    }

    /// 指定された書籍のダウンロードを記録する
    pub fn record_download(&mut self, book_id: BookId) -> Result<u32, DomainError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.book_id() == book_id)
            .ok_or_else(|| {
                DomainError::InvalidValue(format!("注文に存在しない書籍です: {}", book_id))
            })?;
        item.record_download()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Cart;

    fn snapshot_with(lines: &[(BookId, u32, i64, bool)]) -> CartSnapshot {
        let mut cart = Cart::new();
        for (book_id, quantity, price, is_digital) in lines {
            cart.add_or_increment(
                *book_id,
                *quantity,
                Money::usd(*price),
                *is_digital,
                "Test Book".to_string(),
            )
            .unwrap();
        }
        cart.snapshot()
    }

    fn place_order(snapshot: &CartSnapshot, quote: Option<DiscountQuote>) -> Order {
        Order::place(
            OrderId::new(),
            BuyerId::new(),
            snapshot,
            quote,
            ShippingAddress::new("123 Main St".to_string()).unwrap(),
            PaymentMethod::Card,
            PaymentStatus::Completed,
        )
        .unwrap()
    }

    #[test]
    fn test_place_order_totals() {
        // $20の物理本を2冊 → 小計$40、割引なし
        let snapshot = snapshot_with(&[(BookId::new(), 2, 2000, false)]);
        let order = place_order(&snapshot, None);

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.subtotal().amount(), 4000);
        assert_eq!(order.discount_amount().amount(), 0);
        assert_eq!(order.total_amount().amount(), 4000);
        assert_eq!(order.items().len(), 1);
    }

    #[test]
    fn test_place_order_with_discount() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 5000, false)]);
        let quote = DiscountQuote {
            coupon_id: CouponId::new(),
            discount: Money::usd(500),
        };
        let order = place_order(&snapshot, Some(quote));

        assert_eq!(order.discount_amount().amount(), 500);
        assert_eq!(order.total_amount().amount(), 4500);
        assert!(order.coupon_id().is_some());
    }

    #[test]
    fn test_total_never_negative() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let quote = DiscountQuote {
            coupon_id: CouponId::new(),
            discount: Money::usd(9999),
        };
        let order = place_order(&snapshot, Some(quote));

        assert_eq!(order.total_amount().amount(), 0);
    }

    #[test]
    fn test_place_with_empty_cart_fails() {
        let cart = Cart::new();
        let result = Order::place(
            OrderId::new(),
            BuyerId::new(),
            &cart.snapshot(),
            None,
            ShippingAddress::new("123 Main St".to_string()).unwrap(),
            PaymentMethod::Card,
            PaymentStatus::Completed,
        );
        assert_eq!(result.unwrap_err(), DomainError::EmptyCart);
    }

    #[test]
    fn test_total_equals_subtotal_minus_discount() {
        let snapshot = snapshot_with(&[
            (BookId::new(), 2, 2000, false),
            (BookId::new(), 1, 900, true),
        ]);
        let quote = DiscountQuote {
            coupon_id: CouponId::new(),
            discount: Money::usd(490),
        };
        let order = place_order(&snapshot, Some(quote));

        assert_eq!(
            order.total_amount().amount(),
            order.subtotal().amount() - order.discount_amount().amount()
        );
    }

    #[test]
    fn test_cancel_pending_order() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let mut order = place_order(&snapshot, None);

        assert!(order.cancel().is_ok());
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_processing_order() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let mut order = place_order(&snapshot, None);
        order.advance(OrderStatus::Processing).unwrap();

        assert!(order.cancel().is_ok());
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_shipped_order_fails() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let mut order = place_order(&snapshot, None);
        order.advance(OrderStatus::Processing).unwrap();
        order.advance(OrderStatus::Shipped).unwrap();

        let result = order.cancel();
        assert!(matches!(result, Err(DomainError::NotCancellable(_))));
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn test_cancel_twice_fails() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let mut order = place_order(&snapshot, None);

        order.cancel().unwrap();
        let result = order.cancel();
        assert!(matches!(result, Err(DomainError::NotCancellable(_))));
    }

    #[test]
    fn test_advance_full_chain() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let mut order = place_order(&snapshot, None);

        order.advance(OrderStatus::Processing).unwrap();
        order.advance(OrderStatus::Shipped).unwrap();
        order.advance(OrderStatus::Delivered).unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_advance_skipping_fails() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let mut order = place_order(&snapshot, None);

        let result = order.advance(OrderStatus::Shipped);
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_advance_to_cancelled_rejected() {
        // キャンセルは advance ではなく cancel を経由する
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let mut order = place_order(&snapshot, None);

        let result = order.advance(OrderStatus::Cancelled);
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_advance_backward_fails() {
        let snapshot = snapshot_with(&[(BookId::new(), 1, 1000, false)]);
        let mut order = place_order(&snapshot, None);
        order.advance(OrderStatus::Processing).unwrap();

        let result = order.advance(OrderStatus::Pending);
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_restockable_quantities_physical_only() {
        let physical = BookId::new();
        let digital = BookId::new();
        let snapshot = snapshot_with(&[(physical, 2, 2000, false), (digital, 1, 900, true)]);
        let order = place_order(&snapshot, None);

        let quantities = order.restockable_quantities();
        assert_eq!(quantities, vec![(physical, 2)]);
    }

    #[test]
    fn test_restockable_quantities_sums_duplicate_books() {
        let book_id = BookId::new();
        // 同じ書籍が複数明細に分かれている場合は合算される
        let items = vec![
            OrderItem::new(book_id, 2, Money::usd(1000), false).unwrap(),
            OrderItem::new(book_id, 3, Money::usd(900), false).unwrap(),
        ];
        let order = Order::reconstruct(
            OrderId::new(),
            BuyerId::new(),
            Utc::now(),
            items,
            Money::zero(),
            Money::usd(4700),
            None,
            PaymentMethod::Card,
            PaymentStatus::Completed,
            ShippingAddress::new("123 Main St".to_string()).unwrap(),
            OrderStatus::Pending,
        )
        .unwrap();

        assert_eq!(order.restockable_quantities(), vec![(book_id, 5)]);
    }

    #[test]
    fn test_record_download_digital_item() {
        let book_id = BookId::new();
        let snapshot = snapshot_with(&[(book_id, 1, 900, true)]);
        let mut order = place_order(&snapshot, None);

        assert_eq!(order.record_download(book_id).unwrap(), 1);
        assert_eq!(order.record_download(book_id).unwrap(), 2);
        assert_eq!(order.items()[0].digital_downloads(), 2);
    }

    #[test]
    fn test_record_download_physical_item_fails() {
        let book_id = BookId::new();
        let snapshot = snapshot_with(&[(book_id, 1, 2000, false)]);
        let mut order = place_order(&snapshot, None);

        assert!(order.record_download(book_id).is_err());
    }

    #[test]
    fn test_cancel_leaves_download_counters_untouched() {
        let book_id = BookId::new();
        let snapshot = snapshot_with(&[(book_id, 1, 900, true)]);
        let mut order = place_order(&snapshot, None);

        order.record_download(book_id).unwrap();
        order.cancel().unwrap();

        // キャンセルしてもダウンロード記録はそのまま残る
        assert_eq!(order.items()[0].digital_downloads(), 1);
        // 電子版のみの注文では返却対象の在庫は無い
        assert!(order.restockable_quantities().is_empty());
    }
}

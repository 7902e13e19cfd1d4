use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// 注文の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// 新しい一意のOrderIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから OrderId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からOrderIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

/// 書籍の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    /// 新しい一意のBookIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから BookId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からBookIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 購入者の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuyerId(Uuid);

impl BuyerId {
    /// 新しい一意のBuyerIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから BuyerId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からBuyerIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for BuyerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for BuyerId {
    fn default() -> Self {
        Self::new()
    }
}

/// クーポンの一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CouponId(Uuid);

impl CouponId {
    /// 新しい一意のCouponIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから CouponId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からCouponIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CouponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for CouponId {
    fn default() -> Self {
        Self::new()
    }
}

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// 米ドル
    #[allow(clippy::upper_case_acronyms)]
    USD,
}

/// 金額を表す値オブジェクト
/// 最小通貨単位（セント）で保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// 金額と通貨から作成
    pub fn new(amount: i64, currency: String) -> Result<Self, DomainError> {
        let currency = match currency.as_str() {
            "USD" => Currency::USD,
            _ => {
                return Err(DomainError::InvalidValue(format!(
                    "サポートされていない通貨: {}",
                    currency
                )))
            }
        };
        Ok(Self { amount, currency })
    }

    /// 米ドルの金額（セント単位）を作成
    pub fn usd(amount: i64) -> Self {
        Self {
            amount,
            currency: Currency::USD,
        }
    }

    /// ゼロ金額を作成
    pub fn zero() -> Self {
        Self::usd(0)
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 通貨を文字列として取得
    pub fn currency(&self) -> String {
        match self.currency {
            Currency::USD => "USD".to_string(),
        }
    }

    /// 金額を加算
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch);
        }
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        })
    }

    /// 金額を減算（ゼロを下回る場合はゼロに切り上げる）
    pub fn subtract_to_zero(&self, other: &Money) -> Result<Money, DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch);
        }
        Ok(Money {
            amount: (self.amount - other.amount).max(0),
            currency: self.currency,
        })
    }

    /// 金額を乗算
    pub fn multiply(&self, factor: u32) -> Money {
        Money {
            amount: self.amount * factor as i64,
            currency: self.currency,
        }
    }

    /// 指定されたパーセント（0〜100）分の金額を計算
    /// 端数は切り捨てる
    pub fn percentage(&self, percent: i64) -> Money {
        Money {
            amount: self.amount * percent / 100,
            currency: self.currency,
        }
    }

    /// 他の金額以上かどうか
    pub fn is_at_least(&self, other: &Money) -> bool {
        self.amount >= other.amount
    }
}

/// 配送先住所を表す値オブジェクト
/// 元システムの注文テーブルは住所を1つのテキスト列で保持するため
/// 単一フィールドとして扱う
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress(String);

impl ShippingAddress {
    /// 新しい配送先住所を作成
    /// 空文字列・空白のみは拒否する
    pub fn new(address: String) -> Result<Self, DomainError> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidAddress(
                "配送先住所は空にできません".to_string(),
            ));
        }
        if trimmed.len() > 500 {
            return Err(DomainError::InvalidAddress(
                "配送先住所が長すぎます（500文字以内）".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 住所文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 注文のステータス
/// pending → processing → shipped → delivered の一方向チェーン
/// cancelled へは pending / processing からのみ遷移できる
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// 保留中（作成直後）
    Pending,
    /// 処理中
    Processing,
    /// 発送済み
    Shipped,
    /// 配達完了（終端）
    Delivered,
    /// キャンセル済み（終端）
    Cancelled,
}

impl OrderStatus {
    /// 文字列からOrderStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な注文ステータス: {}",
                s
            ))),
        }
    }

    /// 指定されたステータスへ遷移できるかどうか
    /// 遷移表:
    /// - pending    → processing | cancelled
    /// - processing → shipped | cancelled
    /// - shipped    → delivered
    /// - delivered / cancelled → （遷移不可）
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Shipped)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        )
    }

    /// キャンセル可能なステータスかどうか
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// 終端ステータスかどうか
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", status_str)
    }
}

/// 決済ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// 決済待ち
    Pending,
    /// 決済完了
    Completed,
    /// 決済失敗
    Failed,
    /// 返金済み
    Refunded,
}

impl PaymentStatus {
    /// 文字列からPaymentStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な決済ステータス: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        write!(f, "{}", status_str)
    }
}

/// 決済方法
/// 元システムではフォーム入力の自由文字列だったため、閉じた列挙型にする
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// クレジットカード
    Card,
    /// PayPal
    Paypal,
    /// 銀行振込
    BankTransfer,
}

impl PaymentMethod {
    /// 文字列からPaymentMethodを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な決済方法: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method_str = match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank_transfer",
        };
        write!(f, "{}", method_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_creation() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2, "Each OrderId should be unique");
    }

    #[test]
    fn test_money_addition() {
        let money1 = Money::usd(1000);
        let money2 = Money::usd(500);
        let result = money1.add(&money2).unwrap();
        assert_eq!(result.amount(), 1500);
    }

    #[test]
    fn test_money_multiplication() {
        let money = Money::usd(100);
        let result = money.multiply(5);
        assert_eq!(result.amount(), 500);
    }

    #[test]
    fn test_money_subtract_to_zero_floors_at_zero() {
        let subtotal = Money::usd(1000);
        let discount = Money::usd(1500);
        let result = subtotal.subtract_to_zero(&discount).unwrap();
        assert_eq!(result.amount(), 0);
    }

    #[test]
    fn test_money_subtract_to_zero_normal() {
        let subtotal = Money::usd(5000);
        let discount = Money::usd(500);
        let result = subtotal.subtract_to_zero(&discount).unwrap();
        assert_eq!(result.amount(), 4500);
    }

    #[test]
    fn test_money_percentage() {
        let subtotal = Money::usd(5000);
        // 5000セントの10% = 500セント
        assert_eq!(subtotal.percentage(10).amount(), 500);
        // 端数は切り捨て（999の10% = 99）
        assert_eq!(Money::usd(999).percentage(10).amount(), 99);
    }

    #[test]
    fn test_money_is_at_least() {
        let subtotal = Money::usd(3000);
        assert!(subtotal.is_at_least(&Money::usd(3000)));
        assert!(subtotal.is_at_least(&Money::usd(2999)));
        assert!(!subtotal.is_at_least(&Money::usd(3001)));
    }

    #[test]
    fn test_shipping_address_valid() {
        let address = ShippingAddress::new("123 Main St, Springfield".to_string());
        assert!(address.is_ok());
        assert_eq!(address.unwrap().as_str(), "123 Main St, Springfield");
    }

    #[test]
    fn test_shipping_address_empty_fails() {
        assert!(ShippingAddress::new("".to_string()).is_err());
        assert!(ShippingAddress::new("   ".to_string()).is_err());
    }

    #[test]
    fn test_shipping_address_trims_whitespace() {
        let address = ShippingAddress::new("  42 Book Lane  ".to_string()).unwrap();
        assert_eq!(address.as_str(), "42 Book Lane");
    }

    #[test]
    fn test_order_status_from_string_valid() {
        assert_eq!(
            OrderStatus::from_string("pending").unwrap(),
            OrderStatus::Pending
        );
        assert_eq!(
            OrderStatus::from_string("processing").unwrap(),
            OrderStatus::Processing
        );
        assert_eq!(
            OrderStatus::from_string("shipped").unwrap(),
            OrderStatus::Shipped
        );
        assert_eq!(
            OrderStatus::from_string("delivered").unwrap(),
            OrderStatus::Delivered
        );
        assert_eq!(
            OrderStatus::from_string("cancelled").unwrap(),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn test_order_status_from_string_invalid() {
        assert!(OrderStatus::from_string("Pending").is_err()); // 大文字は不可
        assert!(OrderStatus::from_string("unknown").is_err());
        assert!(OrderStatus::from_string("").is_err());
    }

    #[test]
    fn test_order_status_transition_table() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));

        // 逆方向・スキップ・終端からの遷移は全て不可
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
    }

    #[test]
    fn test_order_status_cancellable() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_payment_method_from_string() {
        assert_eq!(
            PaymentMethod::from_string("card").unwrap(),
            PaymentMethod::Card
        );
        assert_eq!(
            PaymentMethod::from_string("paypal").unwrap(),
            PaymentMethod::Paypal
        );
        assert_eq!(
            PaymentMethod::from_string("bank_transfer").unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!(PaymentMethod::from_string("bitcoin").is_err());
    }

    #[test]
    fn test_payment_status_round_trip() {
        for s in ["pending", "completed", "failed", "refunded"] {
            let status = PaymentStatus::from_string(s).unwrap();
            assert_eq!(status.to_string(), s);
        }
    }
}

use crate::domain::model::BookId;

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 無効な注文状態（例: 発送済みの注文をキャンセルしようとした）
    NotCancellable(String),
    /// 無効なステータス遷移（例: delivered から processing へ戻そうとした）
    InvalidTransition { from: String, to: String },
    /// カート追加時の在庫上限超過（参考値チェック。確定時に再検証される）
    OutOfStock {
        title: String,
        available: u32,
    },
    /// 確定時の在庫不足（条件付き更新が失敗した）
    InsufficientStock(BookId),
    /// 無効な数量（例: 0以下の数量）
    InvalidQuantity,
    /// 無効な住所（例: 空の配送先住所）
    InvalidAddress(String),
    /// 書籍が購入できない（未承認・取り扱い終了など）
    BookNotAvailable(String),
    /// 指定された形式（電子版・物理版）では購入できない
    FormatNotOffered(String),
    /// カートが空の状態でチェックアウトしようとした
    EmptyCart,
    /// 注文の検証失敗
    OrderValidation(String),
    /// 通貨の不一致
    CurrencyMismatch,
    /// 無効な値
    InvalidValue(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotCancellable(msg) => write!(f, "Order not cancellable: {}", msg),
            DomainError::InvalidTransition { from, to } => {
                write!(f, "Invalid status transition: {} -> {}", from, to)
            }
            DomainError::OutOfStock { title, available } => {
                write!(f, "Out of stock: {} ({} available)", title, available)
            }
            DomainError::InsufficientStock(book_id) => {
                write!(f, "Insufficient stock for book {}", book_id)
            }
            DomainError::InvalidQuantity => write!(f, "Invalid quantity"),
            DomainError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            DomainError::BookNotAvailable(msg) => write!(f, "Book not available: {}", msg),
            DomainError::FormatNotOffered(msg) => write!(f, "Format not offered: {}", msg),
            DomainError::EmptyCart => write!(f, "Cart is empty"),
            DomainError::OrderValidation(msg) => write!(f, "Order validation failed: {}", msg),
            DomainError::CurrencyMismatch => write!(f, "Currency mismatch"),
            DomainError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

/// クーポン適用時のエラー型
/// 見積もり（quote）と確定（redeem）の両方で使用する
#[derive(Debug, Clone, PartialEq)]
pub enum CouponError {
    /// クーポンコードが存在しない
    NotFound,
    /// クーポンが無効（activeフラグがfalse、または有効期間外）
    Inactive,
    /// 最低注文金額に達していない
    MinimumNotMet { minimum: i64 },
    /// 使用回数上限に達した（並行チェックアウトとの競合を含む）
    Exhausted,
}

impl std::fmt::Display for CouponError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CouponError::NotFound => write!(f, "Coupon not found"),
            CouponError::Inactive => write!(f, "Coupon is inactive or expired"),
            CouponError::MinimumNotMet { minimum } => {
                write!(f, "Minimum order amount not met (minimum: {})", minimum)
            }
            CouponError::Exhausted => write!(f, "Coupon usage limit reached"),
        }
    }
}

impl std::error::Error for CouponError {}

// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::DomainEvent;
use crate::domain::model::{
    BookId, BuyerId, Cart, CatalogBook, Coupon, CouponId, Order, OrderId, OrderStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// ストレージ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
    /// 一時的な失敗（ロック待ちタイムアウト・デッドロック）
    /// コーディネーターが限定回数だけ再試行してよい
    Transient(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
            RepositoryError::Transient(msg) => write!(f, "Transient storage failure: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl RepositoryError {
    /// 再試行してよいエラーかどうか
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Transient(_))
    }
}

/// カタログ読み取りトレイト
/// 書籍マスタはカタログサブシステムが所有するため読み取り専用
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// 書籍IDで価格・在庫・形式・承認状態を取得する
    ///
    /// # Returns
    /// * `Ok(Some(CatalogBook))` - 書籍が見つかった
    /// * `Ok(None)` - 書籍が見つからなかった
    /// * `Err(RepositoryError)` - 取得失敗
    async fn get_book(&self, book_id: BookId) -> Result<Option<CatalogBook>, RepositoryError>;
}

/// カートストアトレイト
/// 購入者ごとのカートを保持する。セッション相当の一時状態であり
/// 暗黙のグローバル状態にせず、常に明示的に受け渡す
#[async_trait]
pub trait CartStore: Send + Sync {
    /// 購入者のカートを取得する（存在しなければ空のカート）
    async fn load(&self, buyer_id: BuyerId) -> Result<Cart, RepositoryError>;

    /// 購入者のカートを保存する
    async fn save(&self, buyer_id: BuyerId, cart: Cart) -> Result<(), RepositoryError>;

    /// 購入者のカートを破棄する
    /// チェックアウト成功時にのみ呼ばれる
    async fn clear(&self, buyer_id: BuyerId) -> Result<(), RepositoryError>;
}

/// 在庫台帳トレイト
/// 物理在庫の減算・加算を条件付き更新として抽象化する
/// 「在庫が負にならない」という不変条件はここだけで守られる
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// 在庫が十分にある場合にのみ原子的に減算する
    /// 読み取りと書き込みを分けず、ガード条件付きの単一更新で行うこと
    ///
    /// # Returns
    /// * `Ok(true)` - 減算成功
    /// * `Ok(false)` - 在庫不足（減算は行われない）
    /// * `Err(RepositoryError)` - 操作失敗
    async fn reserve_and_decrement(
        &self,
        book_id: BookId,
        quantity: u32,
    ) -> Result<bool, RepositoryError>;

    /// 在庫を無条件に加算する
    /// キャンセルによる返却でのみ使用し、電子版には適用しない
    async fn restock(&self, book_id: BookId, quantity: u32) -> Result<(), RepositoryError>;
}

/// クーポン台帳トレイト
/// クーポンの検索と、使用回数の原子的な消費を抽象化する
#[async_trait]
pub trait CouponLedger: Send + Sync {
    /// コードでクーポンを検索する（大文字小文字は区別しない）
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError>;

    /// クーポンの使用回数を原子的に1消費する
    /// `usage_limit IS NULL OR times_used < usage_limit` が成立する場合にのみ
    /// インクリメントし、併せて監査行（coupon_usages）を記録する
    ///
    /// # Returns
    /// * `Ok(true)` - 消費成功
    /// * `Ok(false)` - 上限到達（並行チェックアウトに競り負けた場合を含む）
    /// * `Err(RepositoryError)` - 操作失敗
    async fn redeem(&self, coupon_id: CouponId, buyer_id: BuyerId)
        -> Result<bool, RepositoryError>;
}

/// 注文リポジトリトレイト
/// 注文集約の永続化を抽象化する
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 注文を明細とともに1つのトランザクションで挿入する
    /// 注文はチェックアウト確定時に一度だけ作成される
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError>;

    /// 注文IDで注文を検索する
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// 購入者の注文を取得する
    /// 注文日時の降順で並べて返す
    async fn find_by_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>, RepositoryError>;

    /// 指定されたステータスの注文を取得する
    /// 注文日時の降順で並べて返す
    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError>;

    /// すべての注文を取得する
    /// 注文日時の降順で並べて返す
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError>;

    /// 現在のステータスが期待値と一致する場合にのみ更新する（CAS）
    /// 同じ注文に対するキャンセルと前進の競合はこのガードで直列化される
    ///
    /// # Returns
    /// * `Ok(true)` - 更新成功
    /// * `Ok(false)` - 期待値不一致（並行更新に競り負けた）
    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepositoryError>;

    /// 注文と明細を削除する
    /// クーポン消費に競り負けたチェックアウトの補償でのみ使用する
    async fn delete(&self, order_id: OrderId) -> Result<(), RepositoryError>;

    /// 電子版明細のダウンロード回数を1増やす
    ///
    /// # Returns
    /// * `Ok(true)` - 記録成功
    /// * `Ok(false)` - 該当する電子版明細が存在しない
    async fn increment_digital_downloads(
        &self,
        order_id: OrderId,
        book_id: BookId,
    ) -> Result<bool, RepositoryError>;

    /// 新しい一意の注文IDを生成する
    fn next_identity(&self) -> OrderId;
}

/// イベント発行エラー
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベント発行者トレイト
/// ドメインイベントの通知を抽象化するポート
pub trait EventPublisher: Send + Sync {
    /// イベントを発行する
    fn publish(&self, event: &DomainEvent) -> Result<(), PublisherError>;
}

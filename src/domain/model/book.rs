use crate::domain::model::{BookId, Money};

/// カタログ上の書籍の読み取りモデル
/// 書籍マスタはカタログ・管理サブシステムが所有しており、
/// チェックアウト側からは価格・在庫・形式・承認状態のみを参照する
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogBook {
    /// 書籍ID
    pub id: BookId,
    /// タイトル（カート表示用キャッシュの元）
    pub title: String,
    /// 現在の販売価格
    pub price: Money,
    /// 物理在庫数（電子版のみの書籍では0）
    pub stock: u32,
    /// 物理版を販売しているか
    pub is_physical: bool,
    /// 電子版を販売しているか
    pub is_digital: bool,
    /// 管理者に承認済みか（未承認の書籍は購入不可）
    pub approved: bool,
}

impl CatalogBook {
    /// 新しい読み取りモデルを作成
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BookId,
        title: String,
        price: Money,
        stock: u32,
        is_physical: bool,
        is_digital: bool,
        approved: bool,
    ) -> Self {
        Self {
            id,
            title,
            price,
            stock,
            is_physical,
            is_digital,
            approved,
        }
    }

    /// 指定された形式（電子版かどうか）で販売しているか
    pub fn offers_format(&self, digital: bool) -> bool {
        if digital {
            self.is_digital
        } else {
            self.is_physical
        }
    }
}

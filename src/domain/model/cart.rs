use crate::domain::error::DomainError;
use crate::domain::model::{BookId, Money};

/// カート明細を表す値オブジェクト
/// 単価は追加時のスナップショットで、再追加時に最新価格で上書きされる
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    book_id: BookId,
    quantity: u32,
    unit_price: Money,
    is_digital: bool,
    title: String,
}

impl CartLine {
    /// 新しいカート明細を作成
    /// 数量は1以上である必要がある
    pub fn new(
        book_id: BookId,
        quantity: u32,
        unit_price: Money,
        is_digital: bool,
        title: String,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            book_id,
            quantity,
            unit_price,
            is_digital,
            title,
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

    /// 単価を取得
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// 電子版の購入かどうか
    pub fn is_digital(&self) -> bool {
        self.is_digital
    }

    /// タイトル（表示用キャッシュ）を取得
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 小計を計算（単価 × 数量）
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// 購入者ごとのカート
/// セッションに紐づく一時的な状態で、チェックアウト成功時にのみ破棄される
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// 新しい空のカートを作成
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// カートが空かどうか
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 明細のリストを取得
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// 指定された書籍の明細を取得
    pub fn line(&self, book_id: BookId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.book_id() == book_id)
    }

    /// 指定された書籍の現在の数量を取得（カートに無ければ0）
    pub fn quantity_of(&self, book_id: BookId) -> u32 {
        self.line(book_id).map_or(0, |line| line.quantity())
    }

    /// 書籍をカートに追加、既に存在する場合は数量を加算
    /// 単価と形式は常に最新の選択で上書きする（価格は「現在価格」の意味論）
    pub fn add_or_increment(
        &mut self,
        book_id: BookId,
        quantity: u32,
        unit_price: Money,
        is_digital: bool,
        title: String,
    ) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }

        if let Some(existing) = self.lines.iter_mut().find(|line| line.book_id() == book_id) {
            existing.quantity += quantity;
            existing.unit_price = unit_price;
            existing.is_digital = is_digital;
            existing.title = title;
        } else {
            let line = CartLine::new(book_id, quantity, unit_price, is_digital, title)?;
            self.lines.push(line);
        }

        Ok(())
    }

    /// 指定された書籍の数量を変更
    /// 数量は1以上。カートに存在しない書籍は変更できない
    pub fn set_quantity(&mut self, book_id: BookId, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|line| line.book_id() == book_id)
            .ok_or_else(|| {
                DomainError::InvalidValue(format!("カートに存在しない書籍です: {}", book_id))
            })?;

        line.quantity = quantity;
        Ok(())
    }

    /// 指定された書籍をカートから取り除く
    /// 存在しない場合は何もしない
    pub fn remove(&mut self, book_id: BookId) {
        self.lines.retain(|line| line.book_id() != book_id);
    }

    /// カート全体の小計を再計算する
    /// クライアント提示の合計は信用せず、常に明細から導出する
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .map(|line| line.subtotal())
            .fold(Money::zero(), |acc, amount| acc.add(&amount).unwrap_or(acc))
    }

    /// チェックアウトの入力となる不変スナップショットを取得
    /// 何度でも取り直せる有限のビューであり、元のカートには影響しない
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            subtotal: self.subtotal(),
        }
    }
}

/// カートの不変スナップショット
/// チェックアウト開始時点の明細と小計を固定する
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
    subtotal: Money,
}

impl CartSnapshot {
    /// 明細のリストを取得
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// スナップショット時点の小計を取得
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// 明細が空かどうか
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

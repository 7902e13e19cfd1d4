use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{BookId, BuyerId, CartSnapshot};
use crate::domain::port::{CartStore, CatalogReader};
use std::sync::Arc;

/// カートアプリケーションサービス
/// カートの変更時にカタログを参照して参考値の在庫チェックを行う
/// （確定的な在庫チェックはチェックアウト時に在庫台帳が行う）
pub struct CartService {
    cart_store: Arc<dyn CartStore>,
    catalog_reader: Arc<dyn CatalogReader>,
}

impl CartService {
    /// 新しいカートサービスを作成
    ///
    /// # Arguments
    /// * `cart_store` - カートストア
    /// * `catalog_reader` - カタログリーダー
    pub fn new(cart_store: Arc<dyn CartStore>, catalog_reader: Arc<dyn CatalogReader>) -> Self {
        Self {
            cart_store,
            catalog_reader,
        }
    }

    /// 書籍をカートに追加、既に存在する場合は数量を加算
    /// 物理版の場合、既存数量+追加数量が現在の在庫を超えていれば拒否する
    /// 単価は常に現在のカタログ価格でスナップショットし直す
    ///
    /// # Arguments
    /// * `buyer_id` - 購入者ID
    /// * `book_id` - 書籍ID
    /// * `quantity` - 追加する数量
    /// * `digital` - 電子版を選択したかどうか
    pub async fn add_or_increment(
        &self,
        buyer_id: BuyerId,
        book_id: BookId,
        quantity: u32,
        digital: bool,
    ) -> Result<(), ApplicationError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity.into());
        }

        let book = self
            .catalog_reader
            .get_book(book_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id))
            })?;

        if !book.approved {
            return Err(DomainError::BookNotAvailable(book.title).into());
        }
        if !book.offers_format(digital) {
            return Err(DomainError::FormatNotOffered(book.title).into());
        }

        let mut cart = self.cart_store.load(buyer_id).await?;

        // 参考値チェック: 既にカートに入っている数量 + 追加数量が在庫を超えないこと
        if !digital {
            let prospective = cart.quantity_of(book_id) + quantity;
            if book.stock < prospective {
                return Err(DomainError::OutOfStock {
                    title: book.title,
                    available: book.stock,
                }
                .into());
            }
        }

        cart.add_or_increment(book_id, quantity, book.price, digital, book.title)?;
        self.cart_store.save(buyer_id, cart).await?;
        Ok(())
    }

    /// カート内の書籍の数量を変更
    /// 物理版の場合、新しい数量が現在の在庫を超えていれば拒否する
    ///
    /// # Arguments
    /// * `buyer_id` - 購入者ID
    /// * `book_id` - 書籍ID
    /// * `quantity` - 新しい数量（1以上）
    pub async fn set_quantity(
        &self,
        buyer_id: BuyerId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<(), ApplicationError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity.into());
        }

        let mut cart = self.cart_store.load(buyer_id).await?;
        let line = cart.line(book_id).ok_or_else(|| {
            ApplicationError::NotFound(format!("カートに存在しない書籍です: {}", book_id))
        })?;

        if !line.is_digital() {
            let book = self
                .catalog_reader
                .get_book(book_id)
                .await?
                .ok_or_else(|| {
                    ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id))
                })?;
            if book.stock < quantity {
                return Err(DomainError::OutOfStock {
                    title: book.title,
                    available: book.stock,
                }
                .into());
            }
        }

        cart.set_quantity(book_id, quantity)?;
        self.cart_store.save(buyer_id, cart).await?;
        Ok(())
    }

    /// 書籍をカートから取り除く
    ///
    /// # Arguments
    /// * `buyer_id` - 購入者ID
    /// * `book_id` - 書籍ID
    pub async fn remove(&self, buyer_id: BuyerId, book_id: BookId) -> Result<(), ApplicationError> {
        let mut cart = self.cart_store.load(buyer_id).await?;
        cart.remove(book_id);
        self.cart_store.save(buyer_id, cart).await?;
        Ok(())
    }

    /// カートの不変スナップショットを取得
    /// 明細と再計算済みの小計を返す
    ///
    /// # Arguments
    /// * `buyer_id` - 購入者ID
    pub async fn get_snapshot(&self, buyer_id: BuyerId) -> Result<CartSnapshot, ApplicationError> {
        let cart = self.cart_store.load(buyer_id).await?;
        Ok(cart.snapshot())
    }
}

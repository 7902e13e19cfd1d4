use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{BookId, CatalogBook, Money};
use crate::domain::port::{CatalogReader, RepositoryError};
use async_trait::async_trait;

use sqlx::{MySql, Pool, Row};

/// MySQLカタログリーダー
/// カタログサブシステムが所有するbooksテーブルの読み取り専用ビュー
#[derive(Clone)]
pub struct MySqlCatalogReader {
    pool: Pool<MySql>,
}

impl MySqlCatalogReader {
    /// 新しいMySQLカタログリーダーを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogReader for MySqlCatalogReader {
    async fn get_book(&self, book_id: BookId) -> Result<Option<CatalogBook>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, price_amount, price_currency,
                   stock, is_physical, is_digital, approved
            FROM books
            WHERE id = ?
            "#,
        )
        .bind(book_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "書籍の取得に失敗しました"))
        .map_err(RepositoryError::from)?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let id = BookId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
        })?;

        let price = Money::new(row.get("price_amount"), row.get("price_currency"))
            .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))?;

        Ok(Some(CatalogBook::new(
            id,
            row.get("title"),
            price,
            row.get::<u32, _>("stock"),
            row.get("is_physical"),
            row.get("is_digital"),
            row.get("approved"),
        )))
    }
}

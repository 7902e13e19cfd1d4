use crate::adapter::database_error::DatabaseError;
use crate::domain::model::BookId;
use crate::domain::port::{RepositoryError, StockLedger};
use async_trait::async_trait;

use sqlx::{MySql, Pool};

/// MySQL在庫台帳
/// booksテーブルのstock列に対する条件付き更新で
/// 「在庫が負にならない」不変条件を保証する
#[derive(Clone)]
pub struct MySqlStockLedger {
    pool: Pool<MySql>,
}

impl MySqlStockLedger {
    /// 新しいMySQL在庫台帳を作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockLedger for MySqlStockLedger {
    async fn reserve_and_decrement(
        &self,
        book_id: BookId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        // 読み取ってから書く方式は競合に弱いため、ガード条件付きの
        // 単一UPDATEで判定と減算を同時に行う。rows_affectedが判定結果になる
        let result = sqlx::query(
            r#"
            UPDATE books
            SET stock = stock - ?
            WHERE id = ? AND stock >= ?
            "#,
        )
        .bind(quantity)
        .bind(book_id.to_string())
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "在庫の減算に失敗しました"))
        .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() == 1)
    }

    async fn restock(&self, book_id: BookId, quantity: u32) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE books SET stock = stock + ? WHERE id = ?")
            .bind(quantity)
            .bind(book_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "在庫の返却に失敗しました"))
            .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::OperationFailed(format!(
                "在庫返却対象の書籍が見つかりません: {}",
                book_id
            )));
        }

        Ok(())
    }
}

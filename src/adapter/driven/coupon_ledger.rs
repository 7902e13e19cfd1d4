use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{BuyerId, Coupon, CouponId, CouponType, Money};
use crate::domain::port::{CouponLedger, RepositoryError};
use async_trait::async_trait;
use chrono::Utc;

use sqlx::{MySql, Pool, Row};

/// MySQLクーポン台帳
/// 使用回数の消費は `times_used < usage_limit` をWHERE句に含む
/// 条件付きインクリメントとして実装し、読み取り後の書き込みを排除する
#[derive(Clone)]
pub struct MySqlCouponLedger {
    pool: Pool<MySql>,
}

impl MySqlCouponLedger {
    /// 新しいMySQLクーポン台帳を作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponLedger for MySqlCouponLedger {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        // コードの比較は大文字小文字を区別しない
        let row = sqlx::query(
            r#"
            SELECT id, code, type, amount, min_order_amount,
                   usage_limit, times_used, active, starts_at, expires_at
            FROM coupons
            WHERE UPPER(code) = UPPER(?)
            "#,
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "クーポンの取得に失敗しました"))
        .map_err(RepositoryError::from)?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let id = CouponId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("クーポンIDの解析に失敗しました: {}", e))
        })?;

        let coupon_type = CouponType::from_string(row.get("type")).map_err(|e| {
            RepositoryError::FetchFailed(format!("クーポン種別の解析に失敗しました: {}", e))
        })?;

        let coupon = Coupon::reconstruct(
            id,
            row.get("code"),
            coupon_type,
            row.get("amount"),
            Money::usd(row.get("min_order_amount")),
            row.get::<Option<u32>, _>("usage_limit"),
            row.get::<u32, _>("times_used"),
            row.get("active"),
            row.get("starts_at"),
            row.get::<Option<chrono::DateTime<Utc>>, _>("expires_at"),
        );

        Ok(Some(coupon))
    }

    async fn redeem(
        &self,
        coupon_id: CouponId,
        buyer_id: BuyerId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!(
                    "トランザクション開始に失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        // 上限チェックとインクリメントを1つの条件付きUPDATEで行う
        // 並行する確定同士が同じクーポンを奪い合っても、勝者は1回分しか消費しない
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET times_used = times_used + 1
            WHERE id = ? AND (usage_limit IS NULL OR times_used < usage_limit)
            "#,
        )
        .bind(coupon_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "クーポン使用回数の更新に失敗しました"))
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            // ガード不成立。上限到達か、並行チェックアウトに競り負けた
            tx.rollback().await.ok();
            return Ok(false);
        }

        // 監査行を同じトランザクションで記録する
        sqlx::query(
            r#"
            INSERT INTO coupon_usages (coupon_id, buyer_id, used_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(coupon_id.to_string())
        .bind(buyer_id.to_string())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "クーポン使用履歴の記録に失敗しました"))
        .map_err(RepositoryError::from)?;

        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        Ok(true)
    }
}

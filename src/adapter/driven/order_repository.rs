use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Order, OrderId};
use crate::domain::port::{OrderRepository, RepositoryError};
use async_trait::async_trait;

// MySQL関連のインポート
use crate::domain::model::{
    BookId, BuyerId, CouponId, Money, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
    ShippingAddress,
};
use sqlx::{MySql, Pool, Row};

/// MySQL注文リポジトリ
/// MySQLデータベースを使用して注文を永続化する
/// 注文と明細の挿入・削除は常に1つのトランザクションで行う
#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// 1つの注文に属する行の集合から注文集約を再構築する
    fn build_order_from_rows(
        &self,
        order_id: OrderId,
        rows: &[&sqlx::mysql::MySqlRow],
    ) -> Result<Order, RepositoryError> {
        let first_row = rows[0];

        let buyer_id = BuyerId::from_string(first_row.get("buyer_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("購入者IDの解析に失敗しました: {}", e))
        })?;

        let status = OrderStatus::from_string(first_row.get("status")).map_err(|e| {
            RepositoryError::FetchFailed(format!("注文ステータスの解析に失敗しました: {}", e))
        })?;

        let payment_status =
            PaymentStatus::from_string(first_row.get("payment_status")).map_err(|e| {
                RepositoryError::FetchFailed(format!("決済ステータスの解析に失敗しました: {}", e))
            })?;

        let payment_method =
            PaymentMethod::from_string(first_row.get("payment_method")).map_err(|e| {
                RepositoryError::FetchFailed(format!("決済方法の解析に失敗しました: {}", e))
            })?;

        let shipping_address = ShippingAddress::new(first_row.get("shipping_address"))
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("配送先住所の構築に失敗しました: {}", e))
            })?;

        let currency: String = first_row.get("currency");
        let discount_amount = Money::new(first_row.get("discount_amount"), currency.clone())
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("割引額の構築に失敗しました: {}", e))
            })?;
        let total_amount =
            Money::new(first_row.get("total_amount"), currency).map_err(|e| {
                RepositoryError::FetchFailed(format!("合計金額の構築に失敗しました: {}", e))
            })?;

        let coupon_id = match first_row.get::<Option<String>, _>("coupon_id") {
            Some(coupon_id_str) => Some(CouponId::from_string(&coupon_id_str).map_err(|e| {
                RepositoryError::FetchFailed(format!("クーポンIDの解析に失敗しました: {}", e))
            })?),
            None => None,
        };

        // 注文明細を再構築
        let mut items = Vec::new();
        for row in rows {
            if let (Some(book_id_str), Some(quantity), Some(amount), Some(item_currency)) = (
                row.get::<Option<String>, _>("book_id"),
                row.get::<Option<u32>, _>("quantity"),
                row.get::<Option<i64>, _>("price_amount"),
                row.get::<Option<String>, _>("price_currency"),
            ) {
                let book_id = BookId::from_string(&book_id_str).map_err(|e| {
                    RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e))
                })?;

                let price = Money::new(amount, item_currency).map_err(|e| {
                    RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e))
                })?;

                let item = OrderItem::reconstruct(
                    book_id,
                    quantity,
                    price,
                    row.get("is_digital"),
                    row.get::<u32, _>("digital_downloads"),
                )
                .map_err(|e| {
                    RepositoryError::FetchFailed(format!("注文明細の構築に失敗しました: {}", e))
                })?;

                items.push(item);
            }
        }

        Order::reconstruct(
            order_id,
            buyer_id,
            first_row.get("order_date"),
            items,
            discount_amount,
            total_amount,
            coupon_id,
            payment_method,
            payment_status,
            shipping_address,
            status,
        )
        .map_err(|e| {
            RepositoryError::FetchFailed(format!("注文集約の再構築に失敗しました: {}", e))
        })
    }

    /// JOINされた結果から複数の注文を再構築する
    /// 行の並び順（注文日時の降順）を保ったまま注文IDごとにグループ化する
    fn build_orders_from_rows(
        &self,
        rows: Vec<sqlx::mysql::MySqlRow>,
    ) -> Result<Vec<Order>, RepositoryError> {
        use std::collections::HashMap;

        let mut ordered_ids: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&sqlx::mysql::MySqlRow>> = HashMap::new();
        for row in &rows {
            let order_id: String = row.get("id");
            if !groups.contains_key(&order_id) {
                ordered_ids.push(order_id.clone());
            }
            groups.entry(order_id).or_default().push(row);
        }

        let mut orders = Vec::with_capacity(ordered_ids.len());
        for order_id_str in ordered_ids {
            let order_rows = &groups[&order_id_str];
            let order_id = OrderId::from_string(&order_id_str).map_err(|e| {
                RepositoryError::FetchFailed(format!("注文IDの解析に失敗しました: {}", e))
            })?;
            orders.push(self.build_order_from_rows(order_id, order_rows)?);
        }

        Ok(orders)
    }

    /// ordersとorder_itemsをJOINする共通のSELECT句
    const SELECT_ORDERS: &'static str = r#"
        SELECT
            o.id, o.buyer_id, o.order_date,
            o.discount_amount, o.total_amount, o.currency, o.coupon_id,
            o.payment_method, o.payment_status, o.shipping_address, o.status,
            oi.book_id, oi.quantity, oi.price_amount, oi.price_currency,
            oi.is_digital, oi.digital_downloads
        FROM orders o
        LEFT JOIN order_items oi ON o.id = oi.order_id
    "#;
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
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

        // 注文データをordersテーブルにINSERT
        // 注文は一度だけ作成されるためUPSERTにはしない
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, buyer_id, order_date,
                discount_amount, total_amount, currency, coupon_id,
                payment_method, payment_status, shipping_address, status
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.buyer_id().to_string())
        .bind(order.order_date())
        .bind(order.discount_amount().amount())
        .bind(order.total_amount().amount())
        .bind(order.total_amount().currency())
        .bind(order.coupon_id().map(|id| id.to_string()))
        .bind(order.payment_method().to_string())
        .bind(order.payment_status().to_string())
        .bind(order.shipping_address().as_str())
        .bind(order.status().to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "注文の保存に失敗しました"))
        .map_err(RepositoryError::from)?;

        // 注文明細データをorder_itemsテーブルにINSERT
        for item in order.items() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, book_id, quantity,
                    price_amount, price_currency, is_digital, digital_downloads
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(order.id().to_string())
            .bind(item.book_id().to_string())
            .bind(item.quantity())
            .bind(item.price().amount())
            .bind(item.price().currency())
            .bind(item.is_digital())
            .bind(item.digital_downloads())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細の保存に失敗しました"))
            .map_err(RepositoryError::from)?;
        }

        // トランザクションをコミット
        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!(
                    "トランザクションのコミットに失敗しました: {}",
                    e
                ))
            })
            .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let query = format!("{} WHERE o.id = ?", Self::SELECT_ORDERS);
        let rows = sqlx::query(&query)
            .bind(order_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文の取得に失敗しました"))
            .map_err(RepositoryError::from)?;

        if rows.is_empty() {
            return Ok(None);
        }

        let row_refs: Vec<&sqlx::mysql::MySqlRow> = rows.iter().collect();
        let order = self.build_order_from_rows(order_id, &row_refs)?;
        Ok(Some(order))
    }

    async fn find_by_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>, RepositoryError> {
        let query = format!(
            "{} WHERE o.buyer_id = ? ORDER BY o.order_date DESC",
            Self::SELECT_ORDERS
        );
        let rows = sqlx::query(&query)
            .bind(buyer_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "購入者別注文一覧の取得に失敗しました"))
            .map_err(RepositoryError::from)?;

        self.build_orders_from_rows(rows)
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let query = format!(
            "{} WHERE o.status = ? ORDER BY o.order_date DESC",
            Self::SELECT_ORDERS
        );
        let rows = sqlx::query(&query)
            .bind(status.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "ステータス別注文一覧の取得に失敗しました"))
            .map_err(RepositoryError::from)?;

        self.build_orders_from_rows(rows)
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let query = format!("{} ORDER BY o.order_date DESC", Self::SELECT_ORDERS);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文一覧の取得に失敗しました"))
            .map_err(RepositoryError::from)?;

        self.build_orders_from_rows(rows)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        // 現在のステータスが期待値のままである場合にのみ更新する
        // キャンセルと前進の競合はここで直列化される
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status = ?")
            .bind(next.to_string())
            .bind(order_id.to_string())
            .bind(expected.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文ステータスの更新に失敗しました"))
            .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, order_id: OrderId) -> Result<(), RepositoryError> {
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

        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(order_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文明細の削除に失敗しました"))
            .map_err(RepositoryError::from)?;

        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(order_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx(e, "注文の削除に失敗しました"))
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

        Ok(())
    }

    async fn increment_digital_downloads(
        &self,
        order_id: OrderId,
        book_id: BookId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE order_items
            SET digital_downloads = digital_downloads + 1
            WHERE order_id = ? AND book_id = ? AND is_digital = TRUE
            "#,
        )
        .bind(order_id.to_string())
        .bind(book_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx(e, "ダウンロード回数の更新に失敗しました"))
        .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() >= 1)
    }

    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}

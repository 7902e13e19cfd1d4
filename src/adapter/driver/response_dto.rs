use crate::domain::model::{CartLine, CartSnapshot, Order, OrderItem};
use serde::Serialize;

/// カート明細用のレスポンスDTO
#[derive(Serialize)]
pub struct CartLineResponse {
    pub book_id: String,
    pub title: String,
    pub quantity: u32,
    pub unit_price_amount: i64,
    pub unit_price_currency: String,
    pub is_digital: bool,
    pub subtotal_amount: i64,
}

/// カート用のレスポンスDTO
#[derive(Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub subtotal_amount: i64,
    pub subtotal_currency: String,
}

/// 注文明細用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderItemResponse {
    pub book_id: String,
    pub quantity: u32,
    pub price_amount: i64,
    pub price_currency: String,
    pub is_digital: bool,
    pub digital_downloads: u32,
    pub subtotal_amount: i64,
}

/// 注文一覧用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub order_id: String,
    pub buyer_id: String,
    pub order_date: String,
    pub status: String,
    pub payment_status: String,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub total_currency: String,
}

/// 注文詳細用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub order_id: String,
    pub buyer_id: String,
    pub order_date: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub shipping_address: String,
    pub coupon_id: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub subtotal_amount: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub total_currency: String,
}

impl CartLineResponse {
    /// ドメインオブジェクトからCartLineResponseを作成
    pub fn from_line(line: &CartLine) -> Self {
        Self {
            book_id: line.book_id().to_string(),
            title: line.title().to_string(),
            quantity: line.quantity(),
            unit_price_amount: line.unit_price().amount(),
            unit_price_currency: line.unit_price().currency(),
            is_digital: line.is_digital(),
            subtotal_amount: line.subtotal().amount(),
        }
    }
}

impl CartResponse {
    /// カートスナップショットからCartResponseを作成
    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        Self {
            lines: snapshot
                .lines()
                .iter()
                .map(CartLineResponse::from_line)
                .collect(),
            subtotal_amount: snapshot.subtotal().amount(),
            subtotal_currency: snapshot.subtotal().currency(),
        }
    }
}

impl OrderItemResponse {
    /// ドメインオブジェクトからOrderItemResponseを作成
    pub fn from_item(item: &OrderItem) -> Self {
        Self {
            book_id: item.book_id().to_string(),
            quantity: item.quantity(),
            price_amount: item.price().amount(),
            price_currency: item.price().currency(),
            is_digital: item.is_digital(),
            digital_downloads: item.digital_downloads(),
            subtotal_amount: item.subtotal().amount(),
        }
    }
}

impl OrderSummaryResponse {
    /// ドメインオブジェクトからOrderSummaryResponseを作成
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            buyer_id: order.buyer_id().to_string(),
            order_date: order.order_date().to_rfc3339(),
            status: order.status().to_string(),
            payment_status: order.payment_status().to_string(),
            discount_amount: order.discount_amount().amount(),
            total_amount: order.total_amount().amount(),
            total_currency: order.total_amount().currency(),
        }
    }
}

impl OrderDetailResponse {
    /// ドメインオブジェクトからOrderDetailResponseを作成
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            buyer_id: order.buyer_id().to_string(),
            order_date: order.order_date().to_rfc3339(),
            status: order.status().to_string(),
            payment_status: order.payment_status().to_string(),
            payment_method: order.payment_method().to_string(),
            shipping_address: order.shipping_address().to_string(),
            coupon_id: order.coupon_id().map(|id| id.to_string()),
            items: order.items().iter().map(OrderItemResponse::from_item).collect(),
            subtotal_amount: order.subtotal().amount(),
            discount_amount: order.discount_amount().amount(),
            total_amount: order.total_amount().amount(),
            total_currency: order.total_amount().currency(),
        }
    }
}

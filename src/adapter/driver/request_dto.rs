use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// カート追加用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub buyer_id: Uuid,
    pub book_id: Uuid,
    pub quantity: u32,
    /// 電子版を選択したかどうか
    #[serde(default)]
    pub digital: bool,
}

/// カート数量変更用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct UpdateCartRequest {
    pub buyer_id: Uuid,
    pub book_id: Uuid,
    pub quantity: u32,
}

/// カートからの削除用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct RemoveFromCartRequest {
    pub buyer_id: Uuid,
    pub book_id: Uuid,
}

/// チェックアウト用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub buyer_id: Uuid,
    pub coupon_code: Option<String>,
    pub shipping_address: String,
    pub payment_method: String,
}

/// 注文ステータス更新用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// カート取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct CartQueryParams {
    pub buyer_id: Uuid,
}

/// 注文一覧取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct OrdersQueryParams {
    pub status: Option<String>,
    pub buyer_id: Option<Uuid>,
}

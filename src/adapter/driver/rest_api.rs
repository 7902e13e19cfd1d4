use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use uuid::Uuid;

use crate::application::service::{CartService, CheckoutService, OrderService};
use crate::application::ApplicationError;
use crate::domain::error::{CouponError, DomainError};
use crate::domain::model::{BookId, BuyerId, OrderId};

use crate::adapter::driver::request_dto::{
    AddToCartRequest, CartQueryParams, CheckoutRequest, OrdersQueryParams, RemoveFromCartRequest,
    UpdateCartRequest, UpdateOrderStatusRequest,
};
use crate::adapter::driver::response_dto::{
    CartResponse, OrderDetailResponse, OrderSummaryResponse,
};

/// APIエラーレスポンス
#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

// アプリケーションサービスを含む状態
pub type AppState = AppStateInner;

#[derive(Clone)]
pub struct AppStateInner {
    pub cart_service: Arc<CartService>,
    pub checkout_service: Arc<CheckoutService>,
    pub order_service: Arc<OrderService>,
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update", post(update_cart))
        .route("/cart/remove", post(remove_from_cart))
        .route("/checkout", post(checkout))
        .route("/orders", get(get_orders))
        .route("/orders/:order_id", get(get_order_by_id))
        .route("/orders/:order_id/cancel", post(cancel_order))
        .route("/orders/:order_id/status", post(update_order_status))
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "bookstore-checkout",
        "version": "0.1.0"
    }))
}

// カート追加エンドポイント
async fn add_to_cart(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let buyer_id = BuyerId::from_uuid(request.buyer_id);
    let book_id = BookId::from_uuid(request.book_id);

    match state
        .cart_service
        .add_or_increment(buyer_id, book_id, request.quantity, request.digital)
        .await
    {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) => Err(map_application_error(err)),
    }
}

// カート数量変更エンドポイント
async fn update_cart(
    State(state): State<AppState>,
    Json(request): Json<UpdateCartRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let buyer_id = BuyerId::from_uuid(request.buyer_id);
    let book_id = BookId::from_uuid(request.book_id);

    match state
        .cart_service
        .set_quantity(buyer_id, book_id, request.quantity)
        .await
    {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) => Err(map_application_error(err)),
    }
}

// カート削除エンドポイント
async fn remove_from_cart(
    State(state): State<AppState>,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let buyer_id = BuyerId::from_uuid(request.buyer_id);
    let book_id = BookId::from_uuid(request.book_id);

    match state.cart_service.remove(buyer_id, book_id).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) => Err(map_application_error(err)),
    }
}

// カート取得エンドポイント
async fn get_cart(
    State(state): State<AppState>,
    Query(params): Query<CartQueryParams>,
) -> Result<Json<CartResponse>, (StatusCode, Json<ApiError>)> {
    let buyer_id = BuyerId::from_uuid(params.buyer_id);

    match state.cart_service.get_snapshot(buyer_id).await {
        Ok(snapshot) => Ok(Json(CartResponse::from_snapshot(&snapshot))),
        Err(err) => Err(map_application_error(err)),
    }
}

// チェックアウトエンドポイント
// 成功時は確定した注文の詳細を返す。失敗時もカートは保持される
async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderDetailResponse>), (StatusCode, Json<ApiError>)> {
    let buyer_id = BuyerId::from_uuid(request.buyer_id);

    match state
        .checkout_service
        .checkout(
            buyer_id,
            request.coupon_code.as_deref(),
            request.shipping_address,
            &request.payment_method,
        )
        .await
    {
        Ok(order) => Ok((
            StatusCode::CREATED,
            Json(OrderDetailResponse::from_order(&order)),
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

// 注文キャンセルエンドポイント
async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let order_id = OrderId::from_uuid(order_id);

    match state.order_service.cancel(order_id).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) => Err(map_application_error(err)),
    }
}

// 注文ステータス更新エンドポイント
async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let order_id = OrderId::from_uuid(order_id);

    match state.order_service.advance(order_id, &request.status).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) => Err(map_application_error(err)),
    }
}

// 注文一覧取得エンドポイント
async fn get_orders(
    State(state): State<AppState>,
    query: Result<Query<OrdersQueryParams>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<Vec<OrderSummaryResponse>>, (StatusCode, Json<ApiError>)> {
    let Query(params) = query.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "無効なクエリパラメータです".to_string(),
                code: "INVALID_PARAMETER".to_string(),
            }),
        )
    })?;

    let orders = if let Some(buyer_id) = params.buyer_id {
        // 購入者でフィルタリング
        let buyer_id = BuyerId::from_uuid(buyer_id);
        match state.order_service.get_orders_by_buyer(buyer_id).await {
            Ok(orders) => orders,
            Err(err) => return Err(map_application_error(err)),
        }
    } else if let Some(status_str) = params.status {
        // ステータスでフィルタリング
        match state
            .order_service
            .get_orders_by_status_string(&status_str)
            .await
        {
            Ok(orders) => orders,
            Err(err) => return Err(map_application_error(err)),
        }
    } else {
        // 全注文を取得
        match state.order_service.get_all_orders().await {
            Ok(orders) => orders,
            Err(err) => return Err(map_application_error(err)),
        }
    };

    let response: Vec<OrderSummaryResponse> = orders
        .iter()
        .map(OrderSummaryResponse::from_order)
        .collect();

    Ok(Json(response))
}

// 注文詳細取得エンドポイント
async fn get_order_by_id(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetailResponse>, (StatusCode, Json<ApiError>)> {
    let order_id = OrderId::from_uuid(order_id);

    match state.order_service.get_order_by_id(order_id).await {
        Ok(Some(order)) => Ok(Json(OrderDetailResponse::from_order(&order))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: "指定された注文が見つかりません".to_string(),
                code: "ORDER_NOT_FOUND".to_string(),
            }),
        )),
        Err(err) => Err(map_application_error(err)),
    }
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::CouponError(coupon_err) => map_coupon_error(coupon_err),
        ApplicationError::RepositoryError(repo_err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: format!("{}", repo_err),
                code: "REPOSITORY_ERROR".to_string(),
            }),
        ),
        ApplicationError::EventPublishingFailed(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: msg,
                code: "PUBLISHER_ERROR".to_string(),
            }),
        ),
        ApplicationError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: msg,
                code: "NOT_FOUND".to_string(),
            }),
        ),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
// 検証エラーは400、業務上の競合（在庫・状態遷移）は409
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    match domain_err {
        DomainError::InvalidQuantity => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "無効な数量です".to_string(),
                code: "INVALID_QUANTITY".to_string(),
            }),
        ),
        DomainError::InvalidAddress(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: msg,
                code: "INVALID_ADDRESS".to_string(),
            }),
        ),
        DomainError::EmptyCart => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "カートが空です".to_string(),
                code: "EMPTY_CART".to_string(),
            }),
        ),
        DomainError::OutOfStock { title, available } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: format!("「{}」の在庫は残り{}冊です", title, available),
                code: "OUT_OF_STOCK".to_string(),
            }),
        ),
        DomainError::InsufficientStock(book_id) => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: format!("在庫が不足しています: {}", book_id),
                code: "INSUFFICIENT_STOCK".to_string(),
            }),
        ),
        DomainError::BookNotAvailable(title) => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: format!("「{}」は現在購入できません", title),
                code: "BOOK_NOT_AVAILABLE".to_string(),
            }),
        ),
        DomainError::FormatNotOffered(title) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: format!("「{}」は指定された形式では購入できません", title),
                code: "FORMAT_NOT_OFFERED".to_string(),
            }),
        ),
        DomainError::NotCancellable(msg) => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: msg,
                code: "NOT_CANCELLABLE".to_string(),
            }),
        ),
        DomainError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: format!("{} から {} へは遷移できません", from, to),
                code: "INVALID_TRANSITION".to_string(),
            }),
        ),
        DomainError::OrderValidation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: msg,
                code: "ORDER_VALIDATION".to_string(),
            }),
        ),
        DomainError::CurrencyMismatch => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "通貨が一致しません".to_string(),
                code: "CURRENCY_MISMATCH".to_string(),
            }),
        ),
        DomainError::InvalidValue(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: msg,
                code: "INVALID_VALUE".to_string(),
            }),
        ),
    }
}

// クーポンエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_coupon_error(coupon_err: CouponError) -> (StatusCode, Json<ApiError>) {
    match coupon_err {
        CouponError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: "クーポンコードが見つかりません".to_string(),
                code: "COUPON_NOT_FOUND".to_string(),
            }),
        ),
        CouponError::Inactive => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "クーポンは無効か、有効期間外です".to_string(),
                code: "COUPON_INACTIVE".to_string(),
            }),
        ),
        CouponError::MinimumNotMet { minimum } => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: format!("最低注文金額（{}セント）に達していません", minimum),
                code: "MINIMUM_NOT_MET".to_string(),
            }),
        ),
        CouponError::Exhausted => (
            StatusCode::CONFLICT,
            Json(ApiError {
                error: "クーポンの使用回数が上限に達しました".to_string(),
                code: "COUPON_EXHAUSTED".to_string(),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_application_error_not_found() {
        let app_error = ApplicationError::NotFound("リソースが見つかりません".to_string());
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, "NOT_FOUND");
        assert_eq!(api_error.error, "リソースが見つかりません");
    }

    #[test]
    fn test_map_insufficient_stock_is_conflict() {
        let err = ApplicationError::DomainError(DomainError::InsufficientStock(BookId::new()));
        let (status, Json(api_error)) = map_application_error(err);

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, "INSUFFICIENT_STOCK");
    }

    #[test]
    fn test_map_coupon_exhausted_is_conflict() {
        let err = ApplicationError::CouponError(CouponError::Exhausted);
        let (status, Json(api_error)) = map_application_error(err);

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(api_error.code, "COUPON_EXHAUSTED");
    }

    #[test]
    fn test_api_error_structure() {
        let api_error = ApiError {
            error: "テストエラー".to_string(),
            code: "TEST_ERROR".to_string(),
        };

        // JSON シリアライゼーションのテスト
        let json = serde_json::to_string(&api_error).unwrap();
        assert!(json.contains("テストエラー"));
        assert!(json.contains("TEST_ERROR"));

        // JSON デシリアライゼーションのテスト
        let deserialized: ApiError = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.error, "テストエラー");
        assert_eq!(deserialized.code, "TEST_ERROR");
    }
}

use bookstore_checkout::adapter::driven::{
    ConsoleEventPublisher, ConsoleLogger, InMemoryCartStore, MySqlCatalogReader,
    MySqlCouponLedger, MySqlOrderRepository, MySqlStockLedger,
};
use bookstore_checkout::adapter::driver::rest_api::{create_router, AppStateInner};
use bookstore_checkout::adapter::{DatabaseConfig, DatabaseMigration};
use bookstore_checkout::application::service::{CartService, CheckoutService, OrderService};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== 書店マーケットプレイス チェックアウト REST API ===");
    println!();

    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // データベース設定を読み込む
    let config = DatabaseConfig::from_env()?;
    println!(
        "データベース設定を読み込みました: {}:{}",
        config.host, config.port
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;
    println!("データベース接続プールを作成しました");

    // マイグレーションを実行
    let migration = DatabaseMigration::new(pool.clone());
    migration.run().await?;
    println!("データベースマイグレーションを実行しました");

    // アダプターを作成
    let cart_store = Arc::new(InMemoryCartStore::new());
    let catalog_reader = Arc::new(MySqlCatalogReader::new(pool.clone()));
    let stock_ledger = Arc::new(MySqlStockLedger::new(pool.clone()));
    let coupon_ledger = Arc::new(MySqlCouponLedger::new(pool.clone()));
    let order_repository = Arc::new(MySqlOrderRepository::new(pool.clone()));
    let event_publisher = Arc::new(ConsoleEventPublisher::new());
    let logger = Arc::new(ConsoleLogger::new());

    // アプリケーションサービスを作成
    let cart_service = Arc::new(CartService::new(
        cart_store.clone(),
        catalog_reader.clone(),
    ));
    let checkout_service = Arc::new(CheckoutService::new(
        cart_store.clone(),
        catalog_reader.clone(),
        coupon_ledger.clone(),
        stock_ledger.clone(),
        order_repository.clone(),
        event_publisher.clone(),
        logger.clone(),
    ));
    let order_service = Arc::new(OrderService::new(
        order_repository.clone(),
        stock_ledger.clone(),
        event_publisher.clone(),
        logger.clone(),
    ));

    // アプリケーション状態を作成
    let app_state = AppStateInner {
        cart_service,
        checkout_service,
        order_service,
    };

    // REST APIルーターを作成
    let app = create_router()
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // サーバーを起動
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    println!("REST APIサーバーが起動しました: http://localhost:3000");
    println!("ヘルスチェック: GET http://localhost:3000/health");
    println!("API仕様:");
    println!("  POST /cart/add - カートに書籍を追加");
    println!("  POST /cart/update - カートの数量を変更");
    println!("  POST /cart/remove - カートから書籍を削除");
    println!("  GET  /cart?buyer_id= - カートを取得");
    println!("  POST /checkout - チェックアウト（注文確定）");
    println!("  GET  /orders - 注文一覧取得");
    println!("  GET  /orders/:id - 注文詳細取得");
    println!("  POST /orders/:id/cancel - 注文キャンセル（物理在庫を返却）");
    println!("  POST /orders/:id/status - 注文ステータス前進");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}

// 駆動される側アダプター（リポジトリ・台帳の実装など）

mod cart_store;
mod catalog_reader;
mod console_logger;
mod coupon_ledger;
mod event_publisher;
mod order_repository;
mod stock_ledger;

pub use cart_store::InMemoryCartStore;
pub use catalog_reader::MySqlCatalogReader;
pub use console_logger::ConsoleLogger;
pub use coupon_ledger::MySqlCouponLedger;
pub use event_publisher::ConsoleEventPublisher;
pub use order_repository::MySqlOrderRepository;
pub use stock_ledger::MySqlStockLedger;

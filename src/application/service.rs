mod cart_service;
mod checkout_service;
mod order_service;

pub use cart_service::CartService;
pub use checkout_service::CheckoutService;
pub use order_service::OrderService;

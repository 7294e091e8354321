pub mod order_item_service;
pub mod order_service;
pub mod payment_service;

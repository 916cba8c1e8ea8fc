//! One expert per failure category.

pub mod address;
pub mod coupon;
pub mod menu_item;
pub mod other;
pub mod schema;
pub mod service;
pub mod store_closed;
pub mod timeout;

pub use address::AddressExpert;
pub use coupon::CouponExpert;
pub use menu_item::MenuItemExpert;
pub use other::OtherExpert;
pub use schema::SchemaExpert;
pub use service::ServiceErrorExpert;
pub use store_closed::StoreClosedExpert;
pub use timeout::TimeoutExpert;

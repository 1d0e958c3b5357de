pub mod order_records;
pub mod service_listings;

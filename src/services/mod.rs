pub mod lookup;
pub mod identity;
pub mod order_service;
pub mod order_assembler;
pub mod backfill_service;
pub mod blob_store;
pub mod product_service;
pub mod cart_service;

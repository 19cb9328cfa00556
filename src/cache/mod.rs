pub mod models;
pub mod store;

pub use models::LookupParams;
pub use store::CacheStore;

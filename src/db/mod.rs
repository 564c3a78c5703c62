pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::{InMemoryCatalog, InMemoryCouponStore, Seed};
pub use postgres::{create_pool, PgCatalog, PgCouponStore};
pub use redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};

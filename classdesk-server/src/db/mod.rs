//! Database layer - connection pool, migrations and repositories
//!
//! # Design Principles
//!
//! - One shared PgPool, no per-request connections
//! - Rely on DB constraints and ON CONFLICT, no check-then-insert
//! - Transactions only where a request writes more than one table

pub mod pool;
pub mod repos;

pub use pool::{
    create_pool, create_pool_with_options, run_migrations, DEFAULT_MAX_CONNECTIONS, MIGRATOR,
};
pub use repos::*;
pub use sqlx::PgPool;

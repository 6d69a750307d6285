//! Persistence layer for the holiday plan API.
//!
//! Owns the connection pool, the embedded migrations, the row models and
//! the query functions for the single `holiday_plans` table.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;

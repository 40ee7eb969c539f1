//! Account domain: row types and the SQL that moves them.

pub mod models;
pub mod store;

//! Database clients: a Postgres pool for the optional SQL session store
//! (§6) and an embedded SQLite store for the telemetry ledger (§4.2,
//! which spec.md calls "a local embedded relational database").

mod postgres;
mod sqlite;

pub use postgres::{DatabaseStats, PostgresClient};
pub use sqlite::SqliteStore;

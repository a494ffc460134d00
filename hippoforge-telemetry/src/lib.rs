//! C2: the telemetry ledger. Append-only event log over an embedded
//! SQLite store, plus the analytics queries C8 and C9 depend on
//! (success rate, performance index, problematic-tool detection, tool
//! status) and retention/compaction.

mod ledger;

pub use ledger::{ProblematicTool, TelemetryLedger};

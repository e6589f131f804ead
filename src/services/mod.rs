//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `artifacts.rs` — the two on-disk artifacts: factor-state rename and
//!   policy fragment, plus the derived toggle state.
//! - `reloader.rs` — sshd config dry-run validation and service restart.
//! - `scheduler.rs` — at(1)-backed failsafe job registration/cancellation.
//! - `watchdog.rs` — polling wait loop with its echo guard and interrupt flag.
//! - `notify.rs` — best-effort session broadcast via write(1).
//! - `resolve.rs` — request resolution: option/env defaults and validation.
//! - `audit.rs` — local append-only audit trail.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod artifacts;
pub mod audit;
pub mod notify;
pub mod output;
pub mod reloader;
pub mod resolve;
pub mod scheduler;
pub mod watchdog;

//! End-to-end test support for Lectern
//!
//! - `harness`: isolated SQLite-backed engines
//! - `mocks`: data factories and fault-injecting stores

pub mod harness;
pub mod mocks;

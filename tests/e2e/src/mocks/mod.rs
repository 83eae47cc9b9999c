//! Test doubles and data factories


pub use failing_store::FailingStore;
pub use fixtures::{BatchConfig, TestDataFactory, TestScenario};

//! Common test utilities and infrastructure
//!
//! This module provides shared fixtures and the orchestrator builder used
//! across the orchestrator test suites.

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use helpers::{CallLog, OrchestratorBuilder, TestOrchestrator};

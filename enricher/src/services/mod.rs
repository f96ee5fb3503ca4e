//! Enricher services implementations

pub mod credentials;
pub mod description;
pub mod embedding;
pub mod gemini;
pub mod perception;
pub mod vision;

#[cfg(test)]
pub mod tests;

pub use credentials::*;
pub use description::*;
pub use embedding::*;
pub use gemini::*;
pub use perception::*;
pub use vision::*;

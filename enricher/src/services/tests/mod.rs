//! Tests for enricher services
//!
//! HTTP adapters run against wiremock servers; composite services run
//! against mockall doubles of the traits they depend on.

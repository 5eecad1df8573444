//! Integration test suite.
//!
//! 1. Plain value round trips
//! 2. Aliasing and disjoint views
//! 3. Schema documents and custom codecs

pub mod aliasing_tests;
pub mod helpers;
pub mod round_trip_tests;
pub mod schema_document_tests;

//! # Warrant Testkit
//!
//! Testing utilities for the Warrant workspace: seeded fixtures, proptest
//! generators, and golden vectors.

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
pub use vectors::{generate_all_vectors, GoldenVector};

//! Configuration module for romsprite
//!
//! Provides types, discovery and parsing for `romsprite.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;

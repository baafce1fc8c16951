//! Strand Core - Shared types library.
//!
//! This crate provides the types shared by every Strand component:
//! - `cart` - Cart store, variant pricing and reconciliation
//! - `cli` - Command-line driver for the cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. Catalog records arrive here already fetched; the
//! cart crate decides what to do with them.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, and the product/variant catalog schema

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-process repositories seeded from the demo dataset
//! - **fallback**: decorators serving demo data when a primary read fails
//! - **cache**: read-model caches, in-process or Redis-backed
//! - **live_bus**: broadcast fan-out for live events
//! - **feed**: background generator for the live sales feed
//!
//! Adapters translate between domain types and their storage. They contain
//! no business rules.

pub mod cache;
pub mod fallback;
pub mod feed;
pub mod live_bus;
pub mod memory;

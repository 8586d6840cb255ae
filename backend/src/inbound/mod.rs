//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! REST handlers live under [`http`]; the server-sent event streams sit
//! alongside them in [`sse`].

pub mod http;
pub mod sse;

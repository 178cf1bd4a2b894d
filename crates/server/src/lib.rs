//! HTTP surface for the art advisor.

pub mod api;
pub mod metrics;
pub mod state;

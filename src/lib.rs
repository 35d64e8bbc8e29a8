//! Client-side data-flow engine for server-driven business components.

pub mod api;
pub mod config;
pub mod engine;
pub mod host;
pub mod logging;
pub mod middleware;
pub mod model;
pub mod store;
pub mod workflows;

pub use engine::{Engine, EngineBuilder, EngineError};

//! Platform bindings
//!
//! The web build exposes the engine to the browser shell through
//! `wasm-bindgen`. Native hosts drive `CubeEngine` directly.

#[cfg(target_arch = "wasm32")]
pub mod web;

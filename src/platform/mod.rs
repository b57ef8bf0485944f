//! Platform abstraction layer
//!
//! The browser build exposes a session to JavaScript and wires DOM listeners into it.
//! Native builds drive sessions directly (see the `pocket-arcade` binary).

#[cfg(target_arch = "wasm32")]
pub mod web;

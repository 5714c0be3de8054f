//! ParentBot chat widget.
//!
//! [`controller::ChatController`] owns the session transcript and drives the
//! log, input and send button through the traits in [`surface`]. Replies come
//! from a [`backend::ChatBackend`]; [`backend::HttpBackend`] posts
//! `{message, history}` to the configured endpoint.

pub mod backend;
pub mod config;
pub mod controller;
pub mod render;
pub mod surface;
pub mod types;
#[cfg(feature = "dioxus")]
pub mod ui;

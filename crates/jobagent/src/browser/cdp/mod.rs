//! Chrome DevTools Protocol implementation of the browser capability.
//!
//! Connects to a Chrome instance started with `--remote-debugging-port`,
//! opens a fresh tab, and drives it over a single WebSocket.

mod client;
mod protocol;
mod session;

pub use client::CdpBrowser;

//! Core bridge between untrusted web content in an embedded browser surface
//! and the host's passkey ceremonies.
//!
//! The page and the host exchange JSON envelopes over a narrow message
//! channel. This crate decodes those envelopes, gates them by origin and
//! frame, admits at most one ceremony at a time, runs the ceremony through a
//! host-supplied [`CredentialProvider`] and delivers exactly one reply per
//! admitted request. The host never hands the page its credential store;
//! the page never sees more than a normalized response or a typed error.
//!
//! The embedding surface is expected to:
//! - install a message port named [`page_runtime::INTERFACE_NAME`] and
//!   evaluate [`page_runtime::PAGE_RUNTIME_JS`] on every page load,
//! - forward each port message to [`BridgeController::handle_inbound`] with
//!   the source origin, main-frame flag and a [`ReplyChannel`] wrapping the
//!   port's reply proxy,
//! - call [`BridgeController::navigation_started`] once per new top-level
//!   page load.

pub mod base64url;
pub mod page_runtime;

mod controller;
pub use controller::*;

mod error;
pub use error::*;

mod gate;
pub use gate::*;

mod origin;
pub use origin::*;

mod protocol;
pub use protocol::*;

mod provider;
pub use provider::*;

pub mod logger;

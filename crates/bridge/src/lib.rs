//! Keeps an embedded map in step with host-owned state.
//!
//! [`MapSurface`] owns one map engine instance and the layers drawn on it
//! (markers, route, seamark overlay). Hosts talk to it through a
//! [`CommandChannel`], which decodes [`protocol::Command`] frames from any
//! [`Transport`] and sends back [`protocol::BridgeEvent`]s.
//!
//! Every public operation is safe to call at any time: before `init_map`,
//! after `dispose`, with malformed payloads. Failures are logged and the
//! operation becomes a no-op.

pub mod channel;
pub mod config;
pub mod dom;
pub mod engine;
pub mod headless;
pub mod markers;
pub mod route;
pub mod surface;
pub mod transport;
pub mod viewport;
pub mod visibility;

pub use channel::CommandChannel;
pub use config::{BridgeConfig, ConfigError};
pub use dom::ElementTree;
pub use engine::{ControlPosition, MapEngine, Pointer};
pub use surface::MapSurface;
pub use transport::{AttributeHost, AttributeRelay, CallbackTransport, MessageRelay, Transport};

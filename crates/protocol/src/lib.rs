//! Wire format between a host application and the map bridge.
//!
//! Two directions, each a tagged JSON object:
//! - [`Command`] (host → bridge), tagged by `op`
//! - [`BridgeEvent`] (bridge → host), tagged by `event`
//!
//! Nothing here assumes a transport. A frame may arrive through a direct call,
//! a message queue or a DOM attribute; the codecs only see text.

pub mod command;
pub mod error;
pub mod payload;

pub use command::*;
pub use error::*;
pub use payload::*;

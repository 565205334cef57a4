pub mod clock;
pub mod deferred;
pub mod event_bus;
pub mod metrics;

pub use clock::*;
pub use deferred::*;
pub use event_bus::*;
pub use metrics::*;

//! Real-time fan-out of collection state to connected viewers.

pub mod coordinator;
pub mod events;
pub mod registry;

pub use coordinator::Broadcaster;
pub use events::{ClientEvent, ServerEvent};
pub use registry::ViewerRegistry;

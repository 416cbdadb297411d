pub mod bus;
pub mod event;

pub use bus::{EventBus, Handler};
pub use event::{topics, Event};

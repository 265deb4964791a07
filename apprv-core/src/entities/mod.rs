pub mod event;

pub use event::{Event, GetEventById, PutEvent};

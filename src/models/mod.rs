pub mod event;
pub mod user;

pub use event::{Event, EventType};
pub use user::{Role, User};

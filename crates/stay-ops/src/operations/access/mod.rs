pub mod domain;
pub mod events;
mod registry;
mod session;

#[cfg(test)]
mod tests;

pub use domain::{AccessError, NewPin, PinRecord, PinRole, PinSource};
pub use events::{AccessEvent, AccessEventKind, AccessEventLog, DoorState};
pub use registry::PinRegistry;
pub use session::{AccountDirectory, Session, SessionGuard, SessionRejection};

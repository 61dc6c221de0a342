pub mod domain;
mod registry;

pub use domain::{Guest, GuestDraft, GuestId, NewStay, Stay, StayError, StayId};
pub use registry::{CleanerConfigSource, StayRegistry};

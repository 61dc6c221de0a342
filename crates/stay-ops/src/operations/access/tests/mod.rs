mod common;
mod events;
mod pins;

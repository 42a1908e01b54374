pub mod api;
pub mod entrypoints;
pub mod events;
pub mod releaser;
pub mod sweep;

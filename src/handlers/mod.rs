// handlers/mod.rs - HTTP adapters over the action layer
//
// Public (no identity) → Actions (bearer identity, enforced by the guard)

pub mod actions;
pub mod public;

pub use public::{health, not_found, root};

//! Entity Component System module
//!
//! Defines all components and the per-frame systems that run over them.

pub mod components;
pub mod systems;

pub use components::*;

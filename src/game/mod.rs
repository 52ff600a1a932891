//! Game module - Screens, goals, deferred events and the frame loop

pub mod goals;
pub mod screens;
pub mod state;
pub mod timer;

pub use goals::{FloorGoal, GoalKind, GoalManager};
pub use screens::{Destination, GameScreen};
pub use state::{FrameReport, Game, GameError};
pub use timer::{ScheduledEvent, Scheduler};

//! The publishing pipeline: post lifecycle and interaction tracking.

pub mod interaction;
pub mod lifecycle;
pub mod slug;

pub use interaction::{LikeError, Tracker, ViewOutcome};
pub use lifecycle::{Lifecycle, PostInput, SaveError};

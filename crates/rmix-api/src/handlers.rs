//! Request handlers.

pub mod delivery;
pub mod health;
pub mod jobs;
pub mod status;

pub use delivery::*;
pub use health::*;
pub use jobs::*;
pub use status::*;

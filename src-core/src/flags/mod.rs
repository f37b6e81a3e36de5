pub mod flags_engine;
pub mod flags_model;

pub use flags_engine::evaluate_flags;
pub use flags_model::{Flag, FlagReason, NewFlag};

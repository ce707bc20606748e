pub mod args;
pub mod validation;

pub use args::{Args, Commands, ConfigAction};
pub use validation::{validate_inputs, validate_mount_point};

//! Boundary collaborators that feed the schedule engines: raw input
//! normalisation and persisted rate presets.

pub mod validate;

#[cfg(feature = "presets")]
pub mod presets;

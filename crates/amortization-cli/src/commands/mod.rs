pub mod compare;
pub mod extra;
pub mod planning;
pub mod presets;
pub mod schedule;
pub mod validate;

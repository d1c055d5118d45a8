//! Application wiring

pub mod options;
pub mod render;
pub mod run;

//! Deployment Simulator Library
//!
//! Animates a static deployment record: steps advance on one timer,
//! synthetic log lines arrive on another, and a live-tail switch gates both.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
pub mod workers;

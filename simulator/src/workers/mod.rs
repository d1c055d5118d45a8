//! Background workers

pub mod simulation;

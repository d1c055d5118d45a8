//! Deployment simulation

pub mod clock;
pub mod deployment;
pub mod emitter;
pub mod fsm;
pub mod live_tail;
pub mod session;
pub mod steps;

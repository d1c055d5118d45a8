//! Advancer FSM tests

use deploysim::deploy::fsm::{AdvancerEvent, AdvancerFsm, AdvancerState};
use deploysim::errors::SimError;

#[test]
fn test_fsm_initial_state() {
    let fsm = AdvancerFsm::new();
    assert_eq!(fsm.state(), AdvancerState::Idle);
    assert!(fsm.error().is_none());
    assert_eq!(fsm.ticks(), 0);
}

#[test]
fn test_fsm_run_to_completion() {
    let mut fsm = AdvancerFsm::new();

    // Idle -> Running
    fsm.process(AdvancerEvent::Enable).unwrap();
    assert_eq!(fsm.state(), AdvancerState::Running);

    // Running -> Running
    fsm.process(AdvancerEvent::Tick).unwrap();
    assert_eq!(fsm.state(), AdvancerState::Running);

    // Running -> Completed
    fsm.process(AdvancerEvent::Finish).unwrap();
    assert_eq!(fsm.state(), AdvancerState::Completed);
    assert!(fsm.state().is_terminal());
}

#[test]
fn test_fsm_pause_resume() {
    let mut fsm = AdvancerFsm::new();
    fsm.process(AdvancerEvent::Enable).unwrap();
    fsm.process(AdvancerEvent::Tick).unwrap();

    // Running -> Idle
    fsm.process(AdvancerEvent::Disable).unwrap();
    assert_eq!(fsm.state(), AdvancerState::Idle);

    // Idle -> Running, tick count kept
    fsm.process(AdvancerEvent::Enable).unwrap();
    assert_eq!(fsm.state(), AdvancerState::Running);
    assert_eq!(fsm.ticks(), 1);
}

#[test]
fn test_fsm_terminal_states_stay_put() {
    let mut completed = AdvancerFsm::with_state(AdvancerState::Completed);
    completed.process(AdvancerEvent::Enable).unwrap();
    completed.process(AdvancerEvent::Disable).unwrap();
    assert_eq!(completed.state(), AdvancerState::Completed);
    assert!(completed.process(AdvancerEvent::Tick).is_err());

    let mut failed = AdvancerFsm::with_state(AdvancerState::Failed);
    failed.process(AdvancerEvent::Enable).unwrap();
    assert_eq!(failed.state(), AdvancerState::Failed);
}

#[test]
fn test_fsm_invalid_transition() {
    let mut fsm = AdvancerFsm::new();

    // Idle -> Finish is invalid
    let result = fsm.process(AdvancerEvent::Finish);
    assert!(matches!(result, Err(SimError::InvalidTransition(_))));
    assert_eq!(fsm.state(), AdvancerState::Idle);
}

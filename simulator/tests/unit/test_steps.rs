//! Step sequence tests

use rand::rngs::StdRng;
use rand::SeedableRng;

use deploysim::deploy::steps::{AdvancePolicy, FailurePolicy, StepSequence, Transition};
use deploysim::errors::SimError;
use deploysim::models::deployment::{DeploymentStep, StepStatus};

fn sequence(statuses: &[StepStatus], current: usize) -> StepSequence {
    let steps = statuses
        .iter()
        .enumerate()
        .map(|(i, s)| DeploymentStep::new(format!("step-{i}"), format!("Step {i}"), *s))
        .collect();
    StepSequence::new(steps, current).unwrap()
}

#[test]
fn test_advance_moves_to_next_step() {
    let mut seq = sequence(&[StepStatus::InProgress, StepStatus::Pending, StepStatus::Pending], 0);
    let mut rng = StdRng::seed_from_u64(1);

    let transition = seq.advance(&mut rng, &AdvancePolicy::default());

    assert_eq!(transition, Transition::Started(1));
    assert_eq!(seq.current_index(), 1);
    assert_eq!(seq.steps()[0].status, StepStatus::Completed);
    assert!(seq.steps()[0].duration.is_some());
    assert_eq!(seq.steps()[1].status, StepStatus::InProgress);
    assert_eq!(seq.steps()[2].status, StepStatus::Pending);
    assert!(!seq.is_complete());
}

#[test]
fn test_advance_last_step_completes_sequence() {
    let mut seq = sequence(&[StepStatus::Completed, StepStatus::InProgress], 1);
    let mut rng = StdRng::seed_from_u64(1);

    assert_eq!(seq.advance(&mut rng, &AdvancePolicy::default()), Transition::Finished);
    assert_eq!(seq.current_index(), 1);
    assert!(seq.is_complete());
    assert_eq!(seq.current_step().unwrap().status, StepStatus::Completed);
}

#[test]
fn test_advance_after_completion_is_noop() {
    let mut seq = sequence(&[StepStatus::Completed, StepStatus::Completed], 1);
    let mut rng = StdRng::seed_from_u64(1);
    let before = seq.clone();

    assert_eq!(seq.advance(&mut rng, &AdvancePolicy::default()), Transition::Unchanged);
    assert_eq!(seq, before);
}

#[test]
fn test_failure_at_named_step_halts() {
    let mut seq = sequence(&[StepStatus::InProgress, StepStatus::Pending, StepStatus::Pending], 0);
    let mut rng = StdRng::seed_from_u64(1);
    let policy = AdvancePolicy {
        failure: FailurePolicy::AtStep {
            name: "step-1".to_string(),
        },
        ..Default::default()
    };

    assert_eq!(seq.advance(&mut rng, &policy), Transition::Started(1));
    assert_eq!(seq.advance(&mut rng, &policy), Transition::Failed(1));
    assert!(seq.is_halted());
    assert!(!seq.is_complete());
    assert_eq!(seq.steps()[1].status, StepStatus::Error);
    assert_eq!(seq.steps()[2].status, StepStatus::Pending);

    let halted = seq.clone();
    assert_eq!(seq.advance(&mut rng, &policy), Transition::Unchanged);
    assert_eq!(seq, halted);
}

#[test]
fn test_random_failure_with_certainty() {
    let mut seq = sequence(&[StepStatus::InProgress, StepStatus::Pending], 0);
    let mut rng = StdRng::seed_from_u64(5);
    let policy = AdvancePolicy {
        failure: FailurePolicy::Random { probability: 1.0 },
        ..Default::default()
    };

    assert_eq!(seq.advance(&mut rng, &policy), Transition::Failed(0));
}

#[test]
fn test_current_step_out_of_range() {
    let steps = vec![DeploymentStep::new("only", "Only", StepStatus::Pending)];
    assert!(matches!(StepSequence::new(steps, 1), Err(SimError::OutOfRange(_))));
}

//! Property tests for progression and the log

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use deploysim::deploy::session::{DeploymentSession, SessionOptions};
use deploysim::deploy::steps::{AdvancePolicy, FailurePolicy, StepSequence, Transition};
use deploysim::models::deployment::{DeploymentStep, StepStatus};

use crate::support::{clock, seed};

/// A consistent step layout: completed before `current`, pending after
fn layout() -> impl Strategy<Value = (Vec<StepStatus>, usize)> {
    (1usize..8)
        .prop_flat_map(|n| (Just(n), 0..n, 0u8..3))
        .prop_map(|(n, current, active)| {
            let statuses = (0..n)
                .map(|i| {
                    if i < current {
                        StepStatus::Completed
                    } else if i > current {
                        StepStatus::Pending
                    } else {
                        match active {
                            0 => StepStatus::Pending,
                            1 => StepStatus::InProgress,
                            _ => StepStatus::Completed,
                        }
                    }
                })
                .collect();
            (statuses, current)
        })
}

fn sequence(statuses: &[StepStatus], current: usize) -> StepSequence {
    let steps = statuses
        .iter()
        .enumerate()
        .map(|(i, s)| DeploymentStep::new(format!("step-{i}"), format!("Step {i}"), *s))
        .collect();
    StepSequence::new(steps, current).unwrap()
}

fn active_count(seq: &StepSequence) -> usize {
    seq.steps()
        .iter()
        .filter(|s| s.status == StepStatus::InProgress)
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn progress_is_monotonic_with_one_active_step(
        (statuses, current) in layout(),
        rng_seed in any::<u64>(),
        advances in 0usize..24,
        fail_probability in 0.0f64..0.3,
    ) {
        let mut seq = sequence(&statuses, current);
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let policy = AdvancePolicy {
            failure: FailurePolicy::Random { probability: fail_probability },
            ..Default::default()
        };

        prop_assert!(active_count(&seq) <= 1);
        for _ in 0..advances {
            let before = seq.clone();
            seq.advance(&mut rng, &policy);

            prop_assert!(seq.current_index() >= before.current_index());
            prop_assert!(active_count(&seq) <= 1);
            for (old, new) in before.steps().iter().zip(seq.steps()) {
                if old.status == StepStatus::Completed {
                    prop_assert_eq!(new.status, StepStatus::Completed);
                    prop_assert_eq!(new.duration, old.duration);
                }
            }
        }
    }

    #[test]
    fn complete_sequence_is_left_unchanged(
        (statuses, current) in layout(),
        rng_seed in any::<u64>(),
        extra in 1usize..10,
    ) {
        let mut seq = sequence(&statuses, current);
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let policy = AdvancePolicy::default();

        for _ in 0..(2 * statuses.len() + 1) {
            seq.advance(&mut rng, &policy);
        }
        prop_assert!(seq.is_complete());

        let done = seq.clone();
        for _ in 0..extra {
            prop_assert_eq!(seq.advance(&mut rng, &policy), Transition::Unchanged);
        }
        prop_assert_eq!(seq, done);
    }

    #[test]
    fn log_only_grows(
        ops in prop::collection::vec(0u8..3, 0..60),
        rng_seed in any::<u64>(),
    ) {
        let statuses = [StepStatus::InProgress, StepStatus::Pending, StepStatus::Pending, StepStatus::Pending];
        let mut session = DeploymentSession::with_rng(
            seed(&statuses, 0),
            SessionOptions::default(),
            StdRng::seed_from_u64(rng_seed),
            clock(),
        )
        .unwrap();

        for op in ops {
            let before = session.logs().to_vec();
            match op {
                0 => { session.on_advance_tick(); }
                1 => { session.on_emit_tick(); }
                _ => { session.toggle_live_tail(); }
            }
            let after = session.logs();
            prop_assert!(after.len() >= before.len());
            prop_assert_eq!(&after[..before.len()], &before[..]);
            if !session.live_tail().is_enabled() {
                prop_assert_eq!(after.len(), before.len());
            }
            for pair in after.windows(2) {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
        }
    }
}

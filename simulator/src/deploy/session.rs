//! One simulated deployment and everything that mutates it
//!
//! The session is the single writer: the step sequence, the log, the
//! advancer FSM and the live-tail gate all live here and are only touched
//! through `on_advance_tick`, `on_emit_tick` and the live-tail setters.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::deploy::clock::Clock;
use crate::deploy::deployment::Deployment;
use crate::deploy::emitter::LogEmitter;
use crate::deploy::fsm::{AdvancerEvent, AdvancerFsm, AdvancerState};
use crate::deploy::live_tail::LiveTailController;
use crate::deploy::steps::{AdvancePolicy, Progress, Transition};
use crate::errors::SimError;
use crate::models::deployment::{DeploymentSeed, DeploymentStatus};
use crate::models::log::LogEntry;

/// Step name used when no step can be resolved
const UNKNOWN_STEP: &str = "unknown";

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Step duration and failure policy
    pub advance: AdvancePolicy,

    /// Periodic log lines; empty means the built-in catalog
    pub catalog: Vec<String>,

    /// Initial live-tail state
    pub live_tail: bool,

    /// Whether consumers follow new lines while live-tail is on
    pub auto_scroll: bool,

    /// Fixed RNG seed for reproducible runs
    pub rng_seed: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            advance: AdvancePolicy::default(),
            catalog: Vec::new(),
            live_tail: true,
            auto_scroll: true,
            rng_seed: None,
        }
    }
}

/// Read-only view handed to renderers
///
/// The log is shared with the session, so cloning a snapshot does not copy
/// it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub deployment: Deployment,
    pub logs: Arc<[LogEntry]>,
    pub live_tail: LiveTailController,
    pub advancer: AdvancerState,
    pub progress: Progress,
}

impl SessionSnapshot {
    /// Nothing more will happen without outside input
    pub fn is_settled(&self) -> bool {
        self.advancer.is_terminal() || self.deployment.status != DeploymentStatus::Deploying
    }
}

pub struct DeploymentSession {
    id: Uuid,
    deployment: Deployment,
    log: LogEmitter,
    /// Log as last handed out in snapshots
    published: Arc<[LogEntry]>,
    advancer: AdvancerFsm,
    live_tail: LiveTailController,
    policy: AdvancePolicy,
    rng: StdRng,
    clock: Arc<dyn Clock>,
}

impl DeploymentSession {
    /// Build a session, seeding the RNG from `options.rng_seed` or the OS
    pub fn new(
        seed: DeploymentSeed,
        options: SessionOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SimError> {
        let rng = match options.rng_seed {
            Some(value) => StdRng::seed_from_u64(value),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(seed, options, rng, clock)
    }

    pub fn with_rng(
        seed: DeploymentSeed,
        options: SessionOptions,
        rng: StdRng,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SimError> {
        let mut deployment = Deployment::from_seed(seed)?;

        let advancer = if deployment.steps.is_complete() {
            deployment.refresh_status();
            AdvancerFsm::with_state(AdvancerState::Completed)
        } else if deployment.steps.is_halted() {
            deployment.refresh_status();
            AdvancerFsm::with_state(AdvancerState::Failed)
        } else {
            AdvancerFsm::new()
        };

        let mut log = LogEmitter::new(options.catalog);
        log.seed(deployment.steps.steps(), clock.now());

        let mut session = Self {
            id: Uuid::new_v4(),
            deployment,
            published: Arc::from(log.entries()),
            log,
            advancer,
            live_tail: LiveTailController::new(options.live_tail, options.auto_scroll),
            policy: options.advance,
            rng,
            clock,
        };
        session.sync_advancer();

        info!(
            "Session {} loaded deployment {} ({}, step {}/{}, advancer {:?})",
            session.id,
            session.deployment.id,
            session.deployment.status,
            session.deployment.steps.current_index() + 1,
            session.deployment.steps.len(),
            session.advancer.state()
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn logs(&self) -> &[LogEntry] {
        self.log.entries()
    }

    pub fn live_tail(&self) -> &LiveTailController {
        &self.live_tail
    }

    pub fn advancer_state(&self) -> AdvancerState {
        self.advancer.state()
    }

    /// True while both timers should be running
    pub fn is_ticking(&self) -> bool {
        self.advancer.state() == AdvancerState::Running
    }

    /// Advance timer callback
    pub fn on_advance_tick(&mut self) -> Transition {
        if !self.is_ticking() {
            return Transition::Unchanged;
        }

        let now = self.clock.now();
        let transition = self.deployment.steps.advance(&mut self.rng, &self.policy);
        match transition {
            Transition::Started(index) => {
                let step = &self.deployment.steps.steps()[index];
                self.log.emit_on_transition(step, now);
            }
            Transition::Failed(index) => {
                let step = &self.deployment.steps.steps()[index];
                self.log.emit_on_failure(step, now);
            }
            Transition::Finished | Transition::Unchanged => {}
        }
        self.publish_logs();

        if transition != Transition::Unchanged {
            let status = self.deployment.refresh_status();
            debug!(
                "Deployment {} {:?}, now {} at step {}",
                self.deployment.id,
                transition,
                status,
                self.deployment.steps.current_index()
            );
        }

        self.drive(AdvancerEvent::Tick);
        if self.deployment.steps.is_complete() {
            info!("Deployment {} is healthy", self.deployment.id);
            self.drive(AdvancerEvent::Finish);
        } else if let Transition::Failed(index) = transition {
            let name = self.deployment.steps.steps()[index].name.clone();
            warn!("Deployment {} failed at step {}", self.deployment.id, name);
            self.drive(AdvancerEvent::Fail(name));
        }

        transition
    }

    /// Emit timer callback
    pub fn on_emit_tick(&mut self) -> Option<&LogEntry> {
        if !self.is_ticking() {
            return None;
        }

        let now = self.clock.now();
        let step_name = match self.deployment.steps.current_step() {
            Ok(step) => step.name.as_str(),
            Err(_) => UNKNOWN_STEP,
        };
        self.log.emit_periodic(step_name, &mut self.rng, now);
        self.publish_logs();
        self.log.entries().last()
    }

    /// Flip live-tail and return the new value
    pub fn toggle_live_tail(&mut self) -> bool {
        let enabled = self.live_tail.toggle();
        info!(
            "Live tail {} for deployment {}",
            if enabled { "enabled" } else { "paused" },
            self.deployment.id
        );
        self.sync_advancer();
        enabled
    }

    /// Set live-tail and return the new value
    pub fn set_live_tail(&mut self, enabled: bool) -> bool {
        if self.live_tail.set(enabled) {
            info!(
                "Live tail {} for deployment {}",
                if enabled { "enabled" } else { "paused" },
                self.deployment.id
            );
            self.sync_advancer();
        }
        enabled
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            deployment: self.deployment.clone(),
            logs: Arc::clone(&self.published),
            live_tail: self.live_tail,
            advancer: self.advancer.state(),
            progress: self.deployment.progress(),
        }
    }

    /// Rebuild the shared log if entries were appended since the last call
    fn publish_logs(&mut self) {
        if self.published.len() != self.log.len() {
            self.published = Arc::from(self.log.entries());
        }
    }

    fn sync_advancer(&mut self) {
        let event = if self.live_tail.is_enabled()
            && self.deployment.status == DeploymentStatus::Deploying
        {
            AdvancerEvent::Enable
        } else {
            AdvancerEvent::Disable
        };
        self.drive(event);
    }

    fn drive(&mut self, event: AdvancerEvent) {
        if let Err(e) = self.advancer.process(event) {
            warn!("Advancer rejected event: {}", e);
        }
    }
}

use crate::model::{SimConfig, Step};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides whether a step's simulated work fails.
pub trait FailureInjector: Send {
    fn should_fail(&mut self, step: Step) -> bool;
}

/// Independent draw per step with a fixed failure probability.
pub struct RandomFailure {
    rate: f64,
    rng: StdRng,
}

impl RandomFailure {
    pub fn new(rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rate: rate.clamp(0.0, 1.0),
            rng,
        }
    }
}

impl FailureInjector for RandomFailure {
    fn should_fail(&mut self, _step: Step) -> bool {
        self.rng.gen_bool(self.rate)
    }
}

/// Always fails at one step, never elsewhere.
pub struct FailAt(pub Step);

impl FailureInjector for FailAt {
    fn should_fail(&mut self, step: Step) -> bool {
        step == self.0
    }
}

/// Replays a fixed outcome sequence; succeeds once it runs out.
#[cfg(test)]
pub struct ScriptedOutcomes {
    failures: std::collections::VecDeque<bool>,
}

#[cfg(test)]
impl ScriptedOutcomes {
    pub fn new(failures: impl IntoIterator<Item = bool>) -> Self {
        Self {
            failures: failures.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl FailureInjector for ScriptedOutcomes {
    fn should_fail(&mut self, _step: Step) -> bool {
        self.failures.pop_front().unwrap_or(false)
    }
}

/// Build the injector a run should use for this configuration.
pub fn injector_for(cfg: &SimConfig) -> Box<dyn FailureInjector> {
    match cfg.fail_at {
        Some(step) => Box::new(FailAt(step)),
        None => Box::new(RandomFailure::new(cfg.failure_rate, cfg.seed)),
    }
}

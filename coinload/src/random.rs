//! Randomness used by the journey: user credentials, user selection and think-time.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub trait RandomSource: Send + Sync {
    /// Uniformly distributed integer in `[min, max]`, both inclusive.
    fn int_between(&self, min: u64, max: u64) -> u64;

    /// String of `len` lowercase ASCII letters and digits.
    fn alphanumeric(&self, len: usize) -> String {
        (0..len)
            .map(|_| {
                let idx = self.int_between(0, ALPHANUMERIC.len() as u64 - 1) as usize;
                ALPHANUMERIC[idx] as char
            })
            .collect()
    }
}

/// Thread-local entropy; the default for real runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn int_between(&self, min: u64, max: u64) -> u64 {
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Reproducible source for replaying a run with a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn int_between(&self, min: u64, max: u64) -> u64 {
        // A poisoned rng is still a usable rng.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(min..=max)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Hands out pre-scripted draws, clamped to the requested range. Falls back to `min` once the
    /// script runs dry.
    #[derive(Default)]
    pub(crate) struct ScriptedRandom {
        draws: Mutex<VecDeque<u64>>,
    }

    impl ScriptedRandom {
        pub fn new(draws: &[u64]) -> Self {
            Self {
                draws: Mutex::new(draws.iter().copied().collect()),
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn int_between(&self, min: u64, max: u64) -> u64 {
            let next = self.draws.lock().unwrap().pop_front().unwrap_or(min);
            next.clamp(min, max)
        }
    }
}

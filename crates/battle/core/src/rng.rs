//! Injected randomness for combat rolls.
//!
//! Every random decision in a battle (rebirth slots, resistance and magic mirror
//! rolls, obstacle placement, earthquake targets) is drawn from a
//! [`RandomSource`] passed in by the caller. Replays feed the same source and
//! get the same battle.

use std::collections::VecDeque;

/// Uniform random draws over closed ranges.
pub trait RandomSource {
    /// Uniform integer in `[lower, upper]` (both inclusive).
    ///
    /// Returns `lower` when the range is empty.
    fn next_int(&mut self, lower: i64, upper: i64) -> i64;

    /// Uniform real in `[lower, upper)`.
    fn next_real(&mut self, lower: f64, upper: f64) -> f64;

    /// Percentage roll in `[0, 99]`.
    fn roll_percent(&mut self) -> i64 {
        self.next_int(0, crate::config::BattleConfig::PERCENT_ROLL_MAX)
    }
}

/// Fisher-Yates shuffle driven by a [`RandomSource`].
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.next_int(0, i as i64) as usize;
        items.swap(i, j.min(i));
    }
}

/// Picks one element uniformly, `None` for an empty slice.
pub fn pick<'a, T>(items: &'a [T], rng: &mut dyn RandomSource) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = rng.next_int(0, items.len() as i64 - 1) as usize;
    items.get(index)
}

/// PCG random number generator (PCG-XSH-RR, 32-bit output from 64-bit state).
///
/// Small, fast and fully deterministic for a given seed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PcgRandom {
    state: u64,
}

impl PcgRandom {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: 0 };
        rng.step();
        rng.state = rng.state.wrapping_add(seed);
        rng.step();
        rng
    }

    #[inline]
    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.step();
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    fn next_u64(&mut self) -> u64 {
        (u64::from(self.next_u32()) << 32) | u64::from(self.next_u32())
    }
}

impl RandomSource for PcgRandom {
    fn next_int(&mut self, lower: i64, upper: i64) -> i64 {
        if upper <= lower {
            return lower;
        }
        let span = upper.abs_diff(lower) + 1;
        // Rejection sampling keeps the draw unbiased.
        let zone = u64::MAX - (u64::MAX % span);
        loop {
            let value = self.next_u64();
            if value < zone {
                return lower.wrapping_add((value % span) as i64);
            }
        }
    }

    fn next_real(&mut self, lower: f64, upper: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lower + (upper - lower) * unit
    }
}

/// Adapts any `rand` generator into a [`RandomSource`].
#[derive(Clone, Debug)]
pub struct RandAdapter<R> {
    inner: R,
}

impl<R: rand::RngCore> RandAdapter<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: rand::RngCore> RandomSource for RandAdapter<R> {
    fn next_int(&mut self, lower: i64, upper: i64) -> i64 {
        use rand::Rng;
        if upper <= lower {
            return lower;
        }
        self.inner.gen_range(lower..=upper)
    }

    fn next_real(&mut self, lower: f64, upper: f64) -> f64 {
        use rand::Rng;
        if upper <= lower {
            return lower;
        }
        self.inner.gen_range(lower..upper)
    }
}

/// Replays a fixed sequence of draws.
///
/// Integer draws pop from the front of the script and are clamped into the
/// requested range. Once the script runs out every draw returns `fallback`
/// (clamped as well). Real draws return the low end of the range.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    script: VecDeque<i64>,
    fallback: i64,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = i64>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: 0,
        }
    }

    /// Every draw returns `value`.
    pub fn constant(value: i64) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: value,
        }
    }

    pub fn with_fallback(mut self, fallback: i64) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_int(&mut self, lower: i64, upper: i64) -> i64 {
        let value = self.script.pop_front().unwrap_or(self.fallback);
        if upper <= lower {
            return lower;
        }
        value.clamp(lower, upper)
    }

    fn next_real(&mut self, lower: f64, _upper: f64) -> f64 {
        lower
    }
}

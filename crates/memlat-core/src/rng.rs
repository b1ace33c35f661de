//! Fast deterministic pseudo-random generator.
//!
//! Speed over randomness quality: pattern fill and access shuffling both need
//! a generator that is cheap enough to never show up next to a timed page
//! fault, and reproducible so two runs with the same input size touch the
//! same pages in the same order. Not cryptographic.

/// Linear congruential generator with explicit state.
///
/// A pure function of (seed, call count); multiple instances never interfere
/// with each other, unlike an implicit global generator.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Seed shared by all benchmark runs so reports are comparable run to run.
    pub const DEFAULT_SEED: u64 = 12345;

    /// Create a generator from an explicit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn step(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12345)
            & 0x7fff_ffff;
        self.state
    }

    /// Next pseudo-random byte.
    pub fn next_byte(&mut self) -> u8 {
        (self.step() & 0xff) as u8
    }

    /// Next pseudo-random value in `0..max`.
    ///
    /// `max` must be non-zero.
    pub fn next_below(&mut self, max: u64) -> u64 {
        debug_assert!(max > 0);
        self.step() % max
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..256 {
            assert_eq!(a.next_byte(), b.next_byte());
        }
    }

    #[test]
    fn test_instances_do_not_interfere() {
        let mut reference = Lcg::default();
        let expected: Vec<u8> = (0..32).map(|_| reference.next_byte()).collect();

        // Draw from a second generator between draws from the first.
        let mut a = Lcg::default();
        let mut other = Lcg::new(999);
        let mut observed = Vec::new();
        for _ in 0..32 {
            observed.push(a.next_byte());
            let _ = other.next_byte();
        }
        assert_eq!(observed, expected);
    }

    #[test]
    fn test_next_below_in_range() {
        let mut rng = Lcg::default();
        for _ in 0..10_000 {
            assert!(rng.next_below(100) < 100);
        }
    }

    #[test]
    fn test_output_is_not_constant() {
        let mut rng = Lcg::default();
        let first = rng.next_byte();
        assert!((0..64).any(|_| rng.next_byte() != first));
    }
}

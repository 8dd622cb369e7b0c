//! Explicit seed propagation for stochastic components.

/// A component whose randomness is driven by a reproducible `u64` seed.
pub trait Seedable {
    /// Reseed the component. Subsequent random draws restart from `seed`.
    fn set_seed(&mut self, seed: u64);

    /// Return the seed most recently applied.
    fn seed(&self) -> u64;
}

use rand::Rng;

use crate::result::AiError;

/// A self-contained inference unit.
///
/// Jobs consume a snapshot via their `Input` type. This crate stays
/// storage-agnostic: inputs are provided by callers (infra/runner).
pub trait AiJob {
    type Input;
    type Output;

    /// The input snapshot the job will run inference on.
    fn input(&self) -> &Self::Input;

    /// Execute inference using the caller's random source.
    ///
    /// Must not perform IO. Identical input and an identically seeded `rng`
    /// give identical output.
    fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self::Output, AiError>;
}

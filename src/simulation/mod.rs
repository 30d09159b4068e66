/// Station telemetry simulation.
///
/// Submodules:
/// - `decay`: periodic fill level decay and its injectable randomness.

pub mod decay;

pub mod prng;
pub mod sampling;
pub mod simulation;

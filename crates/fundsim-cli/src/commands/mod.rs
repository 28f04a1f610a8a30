pub mod irr;
pub mod monte_carlo;

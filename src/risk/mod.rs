//! Risk statistics, rate-shift scenarios, value at risk, portfolio
//! aggregation and exit-versus-hold advice.

pub mod engine;
pub mod portfolio;
pub mod recommendation;
pub mod scenario;
pub mod summary;
pub mod var;

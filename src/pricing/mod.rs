//! Forward-rate pricing.

pub mod forward;

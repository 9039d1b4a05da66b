//! Foundational types: currencies, contracts, quotes and the error taxonomy.

pub mod contract;
pub mod currency;
pub mod error;
pub mod quote;

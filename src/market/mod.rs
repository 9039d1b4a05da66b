//! Market data: quote sources, the fallback repository, gap filling and the
//! synthetic series.

pub mod cache;
pub mod gap_fill;
pub mod repository;
pub mod source;
pub mod synthetic;

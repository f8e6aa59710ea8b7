//! Kernel-weighted local polynomial regression and the reactive state
//! behind the interactive explorer.
//!
//! The GUI lives in the binary; everything here is plain numeric code and
//! can be used (and tested) without a window.

pub mod config;
pub mod data;
pub mod regression;
pub mod state;

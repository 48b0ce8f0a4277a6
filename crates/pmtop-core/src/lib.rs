//! # pmtop-core
//!
//! **Watch Apple Silicon breathe, one powermetrics round at a time.**
//!
//! `pmtop-core` turns the text stream of `sudo powermetrics` into a live
//! model of the SoC: per-core clocks and residencies, E/P cluster and GPU
//! channels, and the power rails with their session peaks. The dashboard
//! binary renders that model; this crate never touches the terminal.
//!
//! ## Quick Start
//!
//! ```
//! use pmtop_core::SocMetrics;
//!
//! let mut soc = SocMetrics::default();
//! soc.apply_line("CPU 0 frequency: 1336 MHz");
//! soc.apply_line("CPU 0 active residency:  20.79% (600 MHz: .23% 2064 MHz: 4.4%)");
//!
//! assert_eq!(soc.cores()[0].freq_mhz, 1336);
//! assert_eq!(soc.cores()[0].peak_mhz, 2064);
//! ```
//!
//! ## Architecture
//!
//! Stream ([`sampler`]) → classify ([`parse`]) → fold ([`model`]) → repaint
//!
//! One line in, at most one field group updated. The model is cumulative:
//! cores, rails, and clusters stick once discovered, and every peak only
//! rises. A boundary line closes the round and tells the caller to repaint.

pub mod model;
pub mod parse;
pub mod sampler;

pub use model::{Channel, Cluster, MAX_CORES, Rail, SocMetrics};
pub use parse::{Reading, Update, classify};
pub use sampler::{DEFAULT_INTERVAL_MS, SampleStream, Sampler};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

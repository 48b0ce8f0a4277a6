//! The in-memory model of the most recent powermetrics sample.
//!
//! One [`SocMetrics`] value holds everything the dashboard shows: per-core
//! channels, the cluster and GPU channels, the power-rail table, and the
//! session header fields. The reconciler ([`SocMetrics::apply_line`]) is the
//! only writer; the renderer reads one completed round at a time. Updates are
//! partial by nature — each sampling round overwrites only the signals it
//! mentions, and everything else keeps its last known value.
//!
//! Two rules hold everywhere:
//! - setting a current value also raises the matching peak, so
//!   `peak >= current` after any update sequence;
//! - discovered things stick: cores, rails, and cluster rows never disappear
//!   once seen, even when later rounds omit them.

use std::collections::BTreeMap;

use crate::parse::{self, Reading, Update};

/// Highest supported per-core channel count; indices past this are dropped.
pub const MAX_CORES: usize = 32;

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// A frequency-domain signal: current clock, lifetime peak clock, and the
/// last observed active residency.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Channel {
    /// Current clock in MHz.
    pub freq_mhz: u32,
    /// Highest clock seen this run, in MHz. Never decreases.
    pub peak_mhz: u32,
    /// Last observed active residency, in percent. Not averaged.
    pub active_pct: f64,
}

impl Channel {
    fn apply(&mut self, reading: Reading) {
        match reading {
            Reading::FrequencyMhz(mhz) => {
                self.freq_mhz = mhz;
                self.peak_mhz = self.peak_mhz.max(mhz);
            }
            Reading::Residency { pct, peak_mhz } => {
                self.active_pct = pct;
                if let Some(mhz) = peak_mhz {
                    self.peak_mhz = self.peak_mhz.max(mhz);
                }
            }
        }
    }
}

/// A power rail: current draw and lifetime peak draw, in milliwatts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rail {
    /// Current draw in mW.
    pub mw: u32,
    /// Highest draw seen this run. Never decreases.
    pub peak_mw: u32,
}

impl Rail {
    fn set(&mut self, mw: u32) {
        self.mw = mw;
        self.peak_mw = self.peak_mw.max(mw);
    }
}

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

/// The heterogeneous-core frequency domains powermetrics reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    /// Efficiency cores.
    E,
    /// Performance cores on single-domain parts.
    P,
    P0,
    P1,
    P2,
    P3,
}

impl Cluster {
    /// Every cluster, in classification and display order. `P0-Cluster` does
    /// not contain `P-Cluster` as a substring, but keeping the generic name
    /// first preserves the upstream match order regardless.
    pub const ALL: [Cluster; 6] = [
        Cluster::E,
        Cluster::P,
        Cluster::P0,
        Cluster::P1,
        Cluster::P2,
        Cluster::P3,
    ];

    /// The substring that identifies this cluster's lines in the stream.
    pub fn anchor(self) -> &'static str {
        match self {
            Cluster::E => "E-Cluster",
            Cluster::P => "P-Cluster",
            Cluster::P0 => "P0-Cluster",
            Cluster::P1 => "P1-Cluster",
            Cluster::P2 => "P2-Cluster",
            Cluster::P3 => "P3-Cluster",
        }
    }

    /// Row label used by the dashboard (colon appended by the renderer).
    pub fn label(self) -> &'static str {
        match self {
            Cluster::E => "E-Clust",
            Cluster::P => "P-Clust",
            Cluster::P0 => "P0-Clust",
            Cluster::P1 => "P1-Clust",
            Cluster::P2 => "P2-Clust",
            Cluster::P3 => "P3-Clust",
        }
    }
}

// ---------------------------------------------------------------------------
// SocMetrics
// ---------------------------------------------------------------------------

/// Everything known about the SoC right now: the single state object shared
/// (by strict alternation, not by threads) between the reconciler and the
/// renderer.
pub struct SocMetrics {
    cores: Vec<Channel>,
    gpu: Channel,
    clusters: [Channel; 6],
    cluster_present: [bool; 6],
    rails: BTreeMap<String, Rail>,
    machine_model: Option<String>,
    os_build: Option<String>,
    stamp: String,
    samples: u32,
    show_clusters: bool,
}

impl SocMetrics {
    /// An empty model. One core row is visible from the start; the rest of
    /// the topology is discovered from the stream.
    pub fn new(show_clusters: bool) -> Self {
        Self {
            cores: vec![Channel::default()],
            gpu: Channel::default(),
            clusters: [Channel::default(); 6],
            cluster_present: [false; 6],
            rails: BTreeMap::new(),
            machine_model: None,
            os_build: None,
            stamp: String::new(),
            samples: 0,
            show_clusters,
        }
    }

    /// Classify one sampler line and fold it in. Returns `true` when the
    /// line was an interval boundary — the caller's cue to repaint.
    pub fn apply_line(&mut self, line: &str) -> bool {
        self.apply(parse::classify(line))
    }

    /// Fold one classified update in. Returns `true` on interval boundaries.
    pub fn apply(&mut self, update: Update) -> bool {
        match update {
            Update::Boundary { stamp } => {
                if let Some(stamp) = stamp {
                    self.stamp = stamp;
                }
                self.samples = self.samples.wrapping_add(1);
                return true;
            }
            Update::OsVersion(v) => {
                self.os_build.get_or_insert(v);
            }
            Update::MachineModel(v) => {
                self.machine_model.get_or_insert(v);
            }
            Update::RailPower { label, mw } => {
                self.rails.entry(label).or_default().set(mw);
            }
            Update::CombinedPower { mw } => {
                self.rails.entry("PACKAGE".to_string()).or_default().set(mw);
            }
            Update::Core { index, reading } => {
                // Out-of-range indices are dropped whole, not clamped.
                if index < MAX_CORES {
                    if index >= self.cores.len() {
                        self.cores.resize(index + 1, Channel::default());
                    }
                    self.cores[index].apply(reading);
                }
            }
            Update::Cluster { id, reading } => {
                if self.show_clusters {
                    let slot = &mut self.clusters[id as usize];
                    slot.apply(reading);
                    if slot.freq_mhz > 0 {
                        self.cluster_present[id as usize] = true;
                    }
                }
            }
            Update::Gpu { reading } => self.gpu.apply(reading),
            Update::Skip => {}
        }
        false
    }

    /// Per-core channels, index 0 upward. Grows as cores are discovered and
    /// never shrinks.
    pub fn cores(&self) -> &[Channel] {
        &self.cores
    }

    pub fn gpu(&self) -> &Channel {
        &self.gpu
    }

    pub fn cluster(&self, id: Cluster) -> &Channel {
        &self.clusters[id as usize]
    }

    /// Whether this cluster's frequency has ever been observed nonzero.
    /// Sticky: stays `true` even when the cluster later reads zero.
    pub fn cluster_present(&self, id: Cluster) -> bool {
        self.cluster_present[id as usize]
    }

    /// Every rail observed so far, sorted by label.
    pub fn rails(&self) -> &BTreeMap<String, Rail> {
        &self.rails
    }

    /// One rail by label; zero when it has never been observed.
    pub fn rail(&self, label: &str) -> Rail {
        self.rails.get(label).copied().unwrap_or_default()
    }

    pub fn machine_model(&self) -> Option<&str> {
        self.machine_model.as_deref()
    }

    pub fn os_build(&self) -> Option<&str> {
        self.os_build.as_deref()
    }

    /// Clock stamp of the most recent boundary line ("HH:MM:SS"), or empty
    /// before the first round.
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// Completed-round counter.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn show_clusters(&self) -> bool {
        self.show_clusters
    }
}

impl Default for SocMetrics {
    fn default() -> Self {
        Self::new(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

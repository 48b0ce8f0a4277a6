//! Line classification for the powermetrics text stream.
//!
//! Each sampling round arrives as a loosely-structured block of text:
//!
//! ```text
//! *** Sampled system activity (Thu Oct 21 09:34:26 2021 +0200) (1003.81ms elapsed) ***
//! Machine model: MacBookAir10,1
//! OS version: 21A559
//! E-Cluster HW active frequency: 1332 MHz
//! E-Cluster HW active residency:  20.79% (600 MHz: .23% 972 MHz:  11% 2064 MHz: 4.4%)
//! CPU 0 frequency: 1336 MHz
//! CPU 0 active residency:  20.79% (600 MHz: .23% 972 MHz:  11% 2064 MHz: 4.4%)
//! CPU Power: 128 mW
//! Combined Power (CPU + GPU + ANE): 7651 mW
//! GPU HW active frequency: 711 MHz
//! GPU Power: 1874 mW
//! ```
//!
//! Field positions are not guaranteed, so extraction is anchor-relative:
//! find a keyword, then the nearest colon, then the number. [`classify`]
//! maps a line to at most one [`Update`], checking topics in a fixed
//! priority order so anchor collisions always resolve the same way —
//! power rails before per-core lines, clusters before the bare "GPU"
//! match.

use crate::model::Cluster;

// ---------------------------------------------------------------------------
// Classification result
// ---------------------------------------------------------------------------

/// A reading for a frequency-domain signal (core, cluster, or GPU).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// "... frequency: <n> MHz" — the current clock.
    FrequencyMhz(u32),
    /// "... active residency: <pct>% (...)" — activity, plus the peak clock
    /// named by the last bucket of the breakdown when it is visible.
    Residency { pct: f64, peak_mhz: Option<u32> },
}

/// One line of sampler output, classified by the signal it updates.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// "Sampled system activity ..." — opens a new sampling round.
    Boundary { stamp: Option<String> },
    OsVersion(String),
    MachineModel(String),
    /// "<label> Power: <n> mW"
    RailPower { label: String, mw: u32 },
    /// "Combined Power (CPU + GPU + ANE): <n> mW" — the package total.
    CombinedPower { mw: u32 },
    Core { index: usize, reading: Reading },
    Cluster { id: Cluster, reading: Reading },
    Gpu { reading: Reading },
    /// Anything else. Expected and frequent, never an error.
    Skip,
}

/// Classify one line of sampler output.
pub fn classify(line: &str) -> Update {
    if line.contains("Sampled system") {
        return Update::Boundary {
            stamp: boundary_stamp(line),
        };
    }

    if line.contains("OS ver") {
        return match value_after_colon(line) {
            Some(v) => Update::OsVersion(v.to_string()),
            None => Update::Skip,
        };
    }

    if line.contains("Machine model") {
        return match value_after_colon(line) {
            Some(v) => Update::MachineModel(v.to_string()),
            None => Update::Skip,
        };
    }

    if let Some(at) = line.find("Power:") {
        let label = rail_label(&line[..at]);
        if label.is_empty() {
            return Update::Skip;
        }
        return Update::RailPower {
            label: label.to_string(),
            mw: int_after_colon(line, at).unwrap_or(0),
        };
    }

    if let Some(at) = line.find("Combined Power (CPU + GPU + ANE):") {
        return Update::CombinedPower {
            mw: int_after_colon(line, at).unwrap_or(0),
        };
    }

    if let Some(at) = line.find("CPU") {
        if let Some(rest) = line.get(at + 4..) {
            if rest.starts_with(|c: char| c.is_ascii_digit()) {
                let index = leading_u32(rest).unwrap_or(0) as usize;
                return match reading(line, at, "frequency") {
                    Some(reading) => Update::Core { index, reading },
                    None => Update::Skip,
                };
            }
        }
    }

    for id in Cluster::ALL {
        if let Some(at) = line.find(id.anchor()) {
            return match reading(line, at, "active frequency") {
                Some(reading) => Update::Cluster { id, reading },
                None => Update::Skip,
            };
        }
    }

    if let Some(at) = line.find("GPU") {
        return match reading(line, at, "active frequency") {
            Some(reading) => Update::Gpu { reading },
            None => Update::Skip,
        };
    }

    Update::Skip
}

// ---------------------------------------------------------------------------
// Field extractors
// ---------------------------------------------------------------------------

/// The two-way split every frequency-domain topic shares: a line carrying
/// the frequency anchor updates the current clock, anything else is tried
/// as an active-residency line.
fn reading(line: &str, topic_at: usize, freq_anchor: &str) -> Option<Reading> {
    let scope = &line[topic_at..];
    if scope.contains(freq_anchor) {
        return Some(Reading::FrequencyMhz(
            int_after_colon(line, topic_at).unwrap_or(0),
        ));
    }
    active_residency(scope).map(|(pct, peak_mhz)| Reading::Residency { pct, peak_mhz })
}

/// Integer two characters past the first colon at or after `from`. Leading
/// whitespace is tolerated; a missing colon or number yields `None`.
fn int_after_colon(line: &str, from: usize) -> Option<u32> {
    let colon = line[from..].find(':')? + from;
    leading_u32(line.get(colon + 2..)?)
}

/// Percent and optional peak clock from an "active residency" line.
///
/// The percent follows the first colon after the anchor. The peak comes
/// from the bucket breakdown: buckets are listed in ascending frequency
/// order, so an "MHz" within the final 10 characters of the line names the
/// highest frequency state. Lines extending fewer than 10 characters past
/// the colon carry no usable bucket.
fn active_residency(line: &str) -> Option<(f64, Option<u32>)> {
    let anchor = line.find("active residency")?;
    let colon = line[anchor..].find(':')? + anchor;
    let pct = line.get(colon + 2..).and_then(leading_f64).unwrap_or(0.0);

    let mut peak_mhz = None;
    if line.len().saturating_sub(colon) > 10 {
        let tail_start = line.len() - 10;
        if let Some(tail) = line.get(tail_start..) {
            if let Some(m) = tail.rfind("MHz") {
                peak_mhz = digits_before(line, tail_start + m);
            }
        }
    }

    Some((pct, peak_mhz))
}

/// The label of a "<label> Power: ..." line: everything before " Power",
/// with a decorating "<prefix>: " stripped when present.
fn rail_label(before: &str) -> &str {
    let label = before.strip_suffix(' ').unwrap_or(before);
    match label.rfind(": ") {
        Some(at) => &label[at + 2..],
        None => label,
    }
}

/// Eight clock characters ("HH:MM:SS") around the line's first colon.
fn boundary_stamp(line: &str) -> Option<String> {
    let colon = line.find(':')?;
    let start = colon.checked_sub(2)?;
    line.get(start..start + 8).map(str::to_string)
}

/// Substring two characters past the first colon (the upstream format puts
/// a single space after it).
fn value_after_colon(line: &str) -> Option<&str> {
    let colon = line.find(':')?;
    line.get(colon + 2..).filter(|v| !v.is_empty())
}

/// The leading decimal digit run of `s`, after whitespace.
fn leading_u32(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

/// The leading decimal number of `s`, after whitespace. Accepts a bare
/// fractional form (".23").
fn leading_f64(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

/// The digit run ending just before the "MHz" at `mhz_at`, skipping the
/// separating space.
fn digits_before(line: &str, mhz_at: usize) -> Option<u32> {
    let bytes = line.as_bytes();
    let mut end = mhz_at;
    while end > 0 && bytes[end - 1] == b' ' {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == end {
        return None;
    }
    line[start..end].parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

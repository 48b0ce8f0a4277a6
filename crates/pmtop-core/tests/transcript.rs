//! Integration tests for pmtop-core
//!
//! These exercise the full pipeline the dashboard runs: a replayed
//! powermetrics transcript → line classification → the cumulative model.
//! The transcript below is two rounds in the upstream shape, with the
//! second round shifting topology (P0 appears) and omitting a rail.

use std::io::Write;

use pmtop_core::{Cluster, SampleStream, SocMetrics};

const TRANSCRIPT: &str = "\
*** Sampled system activity (Thu Oct 21 09:34:26 2021 +0200) (1003.81ms elapsed) ***

Machine model: MacBookAir10,1
OS version: 21A559

**** Processor usage ****

E-Cluster HW active frequency: 1332 MHz
E-Cluster HW active residency:  58.81% (600 MHz: .23% 972 MHz:  11% 2064 MHz: 4.4%)
CPU 0 frequency: 1336 MHz
CPU 0 active residency:  20.79% (600 MHz: .23% 972 MHz:  11% 2064 MHz: 4.4%)
CPU 0 idle residency:  79.21%
CPU 1 frequency: 1342 MHz
CPU 1 active residency:  18.50% (600 MHz: .23% 972 MHz:  11% 2064 MHz: 4.4%)
P-Cluster HW active frequency: 2955 MHz
P-Cluster HW active residency:  93.40% (1284 MHz: 1.2% 3204 MHz: 81%)
CPU 4 frequency: 3201 MHz
CPU 4 active residency:  59.00% (1284 MHz: 1.2% 3204 MHz: 45%)
CPU Power: 4188 mW
GPU Power: 1874 mW
ANE Power: 0 mW
DRAM Power: 927 mW
E-Cluster Power: 246 mW
Combined Power (CPU + GPU + ANE): 7651 mW

**** GPU usage ****

GPU HW active frequency: 711 MHz
GPU HW active residency:  67.08% (396 MHz: 4.5% 1278 MHz: 61%)
GPU idle residency:  32.92%
GPU Power: 1874 mW

*** Sampled system activity (Thu Oct 21 09:34:27 2021 +0200) (1001.24ms elapsed) ***

Machine model: Mac14,2
OS version: 22G120

**** Processor usage ****

E-Cluster HW active frequency: 972 MHz
E-Cluster HW active residency:  41.30% (600 MHz:  12% 972 MHz:  18% 2064 MHz: 2.1%)
CPU 0 frequency: 1104 MHz
CPU 0 active residency:  33.10% (600 MHz:  12% 972 MHz:  18% 2064 MHz: 2.1%)
CPU 1 frequency: 988 MHz
CPU 1 active residency:  12.40% (600 MHz:  12% 972 MHz:  18% 2064 MHz: 2.1%)
P0-Cluster HW active frequency: 3036 MHz
P0-Cluster HW active residency:  88.20% (1284 MHz: 3.1% 3204 MHz: 74%)
CPU 4 frequency: 3102 MHz
CPU 4 active residency:  77.70% (1284 MHz: 3.1% 3228 MHz: 61%)
CPU Power: 3950 mW
GPU Power: 2101 mW
ANE Power: 12 mW
Combined Power (CPU + GPU + ANE): 6063 mW

**** GPU usage ****

GPU HW active frequency: 882 MHz
GPU HW active residency:  71.50% (396 MHz: 2.2% 1278 MHz: 66%)
GPU idle residency:  28.50%
GPU Power: 2101 mW
";

/// Replay the transcript through the real stream type and fold every line
/// into a fresh model.
fn replayed() -> SocMetrics {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TRANSCRIPT.as_bytes()).unwrap();

    let mut stream = SampleStream::replay(file.path()).unwrap();
    let mut soc = SocMetrics::default();
    while let Some(line) = stream.next_line().unwrap() {
        soc.apply_line(&line);
    }
    assert_eq!(stream.next_line().unwrap(), None);
    soc
}

#[test]
fn round_counter_and_stamp_follow_the_stream() {
    let soc = replayed();
    assert_eq!(soc.samples(), 2);
    assert_eq!(soc.stamp(), "09:34:27");
}

#[test]
fn header_fields_lock_to_first_observation() {
    let soc = replayed();
    assert_eq!(soc.machine_model(), Some("MacBookAir10,1"));
    assert_eq!(soc.os_build(), Some("21A559"));
}

#[test]
fn topology_grows_to_the_highest_core_seen() {
    let soc = replayed();
    assert_eq!(soc.cores().len(), 5);

    let core1 = soc.cores()[1];
    assert_eq!(core1.freq_mhz, 988);
    assert_eq!(core1.active_pct, 12.4);
    assert_eq!(core1.peak_mhz, 2064);

    // Cores 2 and 3 were never mentioned; they exist, untouched.
    assert_eq!(soc.cores()[2].freq_mhz, 0);
    assert_eq!(soc.cores()[3].peak_mhz, 0);
}

#[test]
fn peaks_rise_and_never_fall_across_rounds() {
    let soc = replayed();

    // Core 4's top bucket moved from 3204 to 3228 in round two.
    let core4 = soc.cores()[4];
    assert_eq!(core4.freq_mhz, 3102);
    assert_eq!(core4.peak_mhz, 3228);

    // Round two drew less than round one; the package peak holds.
    assert_eq!(soc.rail("PACKAGE").mw, 6063);
    assert_eq!(soc.rail("PACKAGE").peak_mw, 7651);

    assert_eq!(soc.rail("GPU").mw, 2101);
    assert_eq!(soc.rail("GPU").peak_mw, 2101);
}

#[test]
fn omitted_rails_keep_their_last_value() {
    let soc = replayed();
    assert_eq!(soc.rail("DRAM").mw, 927);
    assert_eq!(soc.rail("DRAM").peak_mw, 927);
    assert_eq!(soc.rail("E-Cluster").mw, 246);
    assert_eq!(soc.rail("ANE").mw, 12);
}

#[test]
fn cluster_rows_follow_discovery() {
    let soc = replayed();
    assert!(soc.cluster_present(Cluster::E));
    assert!(soc.cluster_present(Cluster::P));
    assert!(soc.cluster_present(Cluster::P0));
    assert!(!soc.cluster_present(Cluster::P1));
    assert!(!soc.cluster_present(Cluster::P3));

    // E updated in round two; P keeps its round-one values.
    assert_eq!(soc.cluster(Cluster::E).freq_mhz, 972);
    assert_eq!(soc.cluster(Cluster::E).peak_mhz, 2064);
    assert_eq!(soc.cluster(Cluster::P).freq_mhz, 2955);
    assert_eq!(soc.cluster(Cluster::P0).freq_mhz, 3036);
}

#[test]
fn gpu_channel_tracks_the_gpu_section() {
    let soc = replayed();
    assert_eq!(soc.gpu().freq_mhz, 882);
    assert_eq!(soc.gpu().active_pct, 71.5);
    assert_eq!(soc.gpu().peak_mhz, 1278);
}

#[test]
fn cluster_rows_can_be_disabled_end_to_end() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TRANSCRIPT.as_bytes()).unwrap();

    let mut stream = SampleStream::replay(file.path()).unwrap();
    let mut soc = SocMetrics::new(false);
    while let Some(line) = stream.next_line().unwrap() {
        soc.apply_line(&line);
    }

    assert!(!soc.cluster_present(Cluster::E));
    assert_eq!(soc.cluster(Cluster::E).freq_mhz, 0);
    // Everything else still lands.
    assert_eq!(soc.cores().len(), 5);
    assert_eq!(soc.rail("PACKAGE").peak_mw, 7651);
}

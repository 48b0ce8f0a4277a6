//! Dashboard rendering — one bordered frame, repainted in place.
//!
//! ```text
//! +- Machine: MacBookAir10,1 ----- OS: 21A559 --------[09:34:26]-[0042]-+
//! | CPU 0:  1860 of 2064 MHz   OOOOOOOOOOOOO....................  32.6% |
//! | CPU 1:   972 of 2064 MHz   OOOO.........................     11.2% |
//! | GPU:     711 of 1278 MHz   OOOOOOOOOOOOOOOOOOOOOOOOOOO....   67.1% |
//! | E-Clust: 1332 of 2064 MHz  OOOOOOOOOOOOOOOOOOOOOOO.......    58.8% |
//! |              cur       max                                          |
//! | Package:    7651 mW  15186 mW                                       |
//! | CPU:        4188 mW   9240 mW                                       |
//! +---- Ctrl+C to exit -------------------------------------------------+
//! ```
//!
//! Every element sits at a fixed column measured from the frame's top-left,
//! and all writes are clipped to the area, so odd terminal sizes garble at
//! worst and never panic. Below the minimum size nothing is drawn except a
//! resize hint. The whole frame is rebuilt on every draw, which is also what
//! handles resizes.

use ratatui::prelude::*;

use super::app::App;
use pmtop_core::model::{Channel, Cluster, SocMetrics};

/// Narrowest terminal the fixed columns fit in.
const MIN_WIDTH: u16 = 42;
/// Row of the first core line.
const TOP: u16 = 2;
/// Column of the row labels.
const LABEL_X: u16 = 2;
/// Column of the frequency readout.
const VALUE_X: u16 = 11;
/// Column where the gauge bar starts.
const BAR_X: u16 = 29;

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    render(f.buffer_mut(), area, app.metrics());
}

/// Height the current model needs: core rows, the GPU row plus spacing, the
/// header and three fixed power rows, and one row per observed rail. Cluster
/// rows are not counted; they render only into slack beyond this minimum.
fn required_height(m: &SocMetrics) -> u16 {
    (m.cores().len() + 2 + 5 + m.rails().len()) as u16
}

/// Paint the whole dashboard into `buf`: a pure function of the model and
/// the area, which is what the layout tests drive.
pub fn render(buf: &mut Buffer, area: Rect, m: &SocMetrics) {
    let (w, h) = (area.width, area.height);
    let req_h = required_height(m);
    if w < MIN_WIDTH || h < req_h {
        let hint = format!("Enlarge window to {MIN_WIDTH}x{req_h}, current {w}x{h}");
        put(buf, area, 0, 0, &hint, Style::default());
        return;
    }

    frame_border(buf, area, m);

    let mut row = TOP;
    for (i, core) in m.cores().iter().enumerate() {
        put(buf, area, LABEL_X, row, &format!("CPU {i}:"), Style::default());
        channel_row(buf, area, row, core);
        row += 1;
    }

    put(buf, area, LABEL_X, row, "GPU:", Style::default());
    channel_row(buf, area, row, m.gpu());
    row += 1;

    if m.show_clusters() && h >= req_h + 2 {
        for id in Cluster::ALL {
            if id != Cluster::E && !m.cluster_present(id) {
                continue;
            }
            let label = format!("{}:", id.label());
            put(buf, area, LABEL_X, row, &label, Style::default());
            channel_row(buf, area, row, m.cluster(id));
            row += 1;
        }
    }

    power_table(buf, area, row, m);
}

/// Border, session header overlays, and the exit hint. Drawn first; long
/// content rows may overwrite the bottom edge, matching the upstream look.
fn frame_border(buf: &mut Buffer, area: Rect, m: &SocMetrics) {
    let (w, h) = (area.width, area.height);
    let horiz = "-".repeat(w as usize);
    put(buf, area, 0, 0, &horiz, Style::default());
    put(buf, area, 0, h - 1, &horiz, Style::default());
    for y in 1..h - 1 {
        put(buf, area, 0, y, "|", Style::default());
        put(buf, area, w - 1, y, "|", Style::default());
    }
    for (x, y) in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
        put(buf, area, x, y, "+", Style::default());
    }

    if w > 48 {
        if let Some(model) = m.machine_model() {
            put(buf, area, 2, 0, &format!(" Machine: {model} "), Style::default());
        }
    }
    if w > 65 {
        if let Some(os) = m.os_build() {
            put(buf, area, 33, 0, &format!(" OS: {os} "), Style::default());
        }
    }
    let counter = format!("[{}]-[{:04}]", m.stamp(), m.samples());
    put(buf, area, w - 20, 0, &counter, Style::default());
    put(buf, area, 4, h - 1, " Ctrl+C to exit ", Style::default());
}

/// One frequency-domain row: clock (throttle colored), peak, gauge, percent.
fn channel_row(buf: &mut Buffer, area: Rect, row: u16, chan: &Channel) {
    let freq_style =
        Style::default().fg(throttle_color(chan.active_pct, chan.freq_mhz, chan.peak_mhz));
    put(buf, area, VALUE_X, row, &format!("{:4}", chan.freq_mhz), freq_style);
    put(
        buf,
        area,
        VALUE_X + 5,
        row,
        &format!("of {:4} MHz", chan.peak_mhz),
        Style::default(),
    );
    put(
        buf,
        area,
        area.width - 8,
        row,
        &format!("{:5.1}%", chan.active_pct),
        Style::default(),
    );
    gauge(buf, area, row, chan.active_pct);
}

/// The activity bar between the clock readout and the percent column.
fn gauge(buf: &mut Buffer, area: Rect, row: u16, pct: f64) {
    let width = (area.width - 9 - BAR_X) as usize;
    let filled = ((width as f64 * pct / 100.0) as usize).min(width);
    let fill_style = Style::default().fg(gauge_color(pct));
    put(buf, area, BAR_X, row, &"O".repeat(filled), fill_style);
    put(
        buf,
        area,
        BAR_X + filled as u16,
        row,
        &".".repeat(width - filled),
        Style::default(),
    );
}

/// The power table: a header, the three rails every machine has, then the
/// rest in label order. Unobserved fixed rails read zero.
fn power_table(buf: &mut Buffer, area: Rect, top: u16, m: &SocMetrics) {
    let maxlen = m.rails().keys().map(String::len).max().unwrap_or(0) as u16;
    let cur_x = LABEL_X + maxlen + 2;
    let max_x = cur_x + 10;

    put(buf, area, LABEL_X + 13, top, "cur       max", Style::default());

    let mut row = top + 1;
    for (label, key) in [("Package:", "PACKAGE"), ("CPU:", "CPU"), ("GPU:", "GPU")] {
        let rail = m.rail(key);
        put(buf, area, LABEL_X, row, label, Style::default());
        put(buf, area, cur_x, row, &format!("{:5} mW", rail.mw), Style::default());
        put(buf, area, max_x, row, &format!("{:5} mW", rail.peak_mw), Style::default());
        row += 1;
    }
    for (label, rail) in m.rails() {
        if matches!(label.as_str(), "PACKAGE" | "CPU" | "GPU") {
            continue;
        }
        put(buf, area, LABEL_X, row, &format!("{label}:"), Style::default());
        put(buf, area, cur_x, row, &format!("{:5} mW", rail.mw), Style::default());
        put(buf, area, max_x, row, &format!("{:5} mW", rail.peak_mw), Style::default());
        row += 1;
    }
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// Clock color: a busy channel running well below its peak is throttling.
/// Idle channels are never flagged, and neither is a channel whose peak is
/// still unknown. The ratio is integer math, like the rest of the column.
fn throttle_color(active_pct: f64, freq_mhz: u32, peak_mhz: u32) -> Color {
    if active_pct < 90.0 {
        return Color::Green;
    }
    if peak_mhz == 0 {
        return Color::Green;
    }
    let ratio = 100 * u64::from(freq_mhz) / u64::from(peak_mhz);
    if ratio < 80 {
        Color::Red
    } else if ratio < 95 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Gauge fill color by load.
fn gauge_color(pct: f64) -> Color {
    if pct > 80.0 {
        Color::Red
    } else if pct > 60.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

// ---------------------------------------------------------------------------
// Clipped writes
// ---------------------------------------------------------------------------

/// Write `text` at (`x`, `y`) relative to `area`, truncated at the right
/// edge. Out-of-range positions are dropped silently.
fn put(buf: &mut Buffer, area: Rect, x: u16, y: u16, text: &str, style: Style) {
    if x >= area.width || y >= area.height {
        return;
    }
    let max = (area.width - x) as usize;
    buf.set_stringn(area.x + x, area.y + y, text, max, style);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

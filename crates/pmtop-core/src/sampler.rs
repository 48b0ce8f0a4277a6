//! The powermetrics subprocess and the line stream it feeds the parser.
//!
//! powermetrics needs root, so the command runs through `sudo` with stderr
//! left on the terminal for the password prompt. A [`SampleStream`] can also
//! replay a captured transcript from a file, which is how the dashboard runs
//! on machines without powermetrics at all.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use log::{debug, warn};

/// Sampling period handed to powermetrics when none is given, in ms.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Builder for the live `sudo powermetrics` subprocess.
pub struct Sampler {
    interval_ms: u64,
}

impl Sampler {
    pub fn new(interval_ms: u64) -> Self {
        Self { interval_ms }
    }

    /// Argument vector handed to `sudo`. The two samplers cover every line
    /// the classifier understands.
    fn argv(&self) -> Vec<String> {
        vec![
            "powermetrics".to_string(),
            "--samplers".to_string(),
            "cpu_power,gpu_power".to_string(),
            "-i".to_string(),
            self.interval_ms.to_string(),
        ]
    }

    /// Spawn the subprocess with stdout piped. Fails when sudo itself cannot
    /// be started; a wrong password surfaces later as an early end of stream.
    pub fn spawn(&self) -> io::Result<SampleStream> {
        let mut child = Command::new("sudo")
            .args(self.argv())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        debug!(
            "spawned sudo powermetrics -i {} (pid {})",
            self.interval_ms,
            child.id()
        );
        let stdout = child.stdout.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "powermetrics stdout not captured")
        })?;
        Ok(SampleStream {
            reader: Box::new(BufReader::new(stdout)),
            child: Some(child),
        })
    }
}

/// A line-at-a-time view of powermetrics output, live or replayed.
///
/// Dropping the stream kills and reaps the subprocess when one is attached.
pub struct SampleStream {
    reader: Box<dyn BufRead>,
    child: Option<Child>,
}

impl SampleStream {
    /// Replay a captured transcript instead of sampling live.
    pub fn replay(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        debug!("replaying transcript {}", path.display());
        Ok(Self {
            reader: Box::new(BufReader::new(file)),
            child: None,
        })
    }

    /// Next line with the trailing newline removed. `Ok(None)` marks the end
    /// of the stream; that is a terminal condition, not an error.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl Drop for SampleStream {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!("failed to kill powermetrics: {e}");
            }
            let _ = child.wait();
            debug!("powermetrics reaped");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn argv_names_both_samplers_and_the_interval() {
        let argv = Sampler::new(500).argv();
        assert_eq!(
            argv,
            ["powermetrics", "--samplers", "cpu_power,gpu_power", "-i", "500"]
        );
    }

    #[test]
    fn lines_come_back_newline_stripped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"first\nsecond\r\nthird").unwrap();
        let mut stream = SampleStream::replay(file.path()).unwrap();

        assert_eq!(stream.next_line().unwrap().as_deref(), Some("first"));
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("second"));
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("third"));
        assert_eq!(stream.next_line().unwrap(), None);
    }

    #[test]
    fn end_of_stream_repeats_none() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut stream = SampleStream::replay(file.path()).unwrap();
        assert_eq!(stream.next_line().unwrap(), None);
        assert_eq!(stream.next_line().unwrap(), None);
    }

    #[test]
    fn blank_lines_survive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\n\nx\n").unwrap();
        let mut stream = SampleStream::replay(file.path()).unwrap();

        assert_eq!(stream.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(stream.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(stream.next_line().unwrap().as_deref(), Some("x"));
        assert_eq!(stream.next_line().unwrap(), None);
    }

    #[test]
    fn replay_of_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-transcript");
        assert!(SampleStream::replay(&missing).is_err());
    }
}

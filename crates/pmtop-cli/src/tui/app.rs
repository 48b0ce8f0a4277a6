//! TUI lifecycle and the blocking sample-to-render loop.
//!
//! Design: single-threaded on purpose. The loop blocks on the next sampler
//! line, folds it into the model, and repaints only when a line opens a new
//! sampling round. Reconciler and renderer touch the model in strict
//! alternation on this one thread, so there is no locking anywhere.

use std::io;
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use pmtop_core::{SampleStream, SocMetrics};

/// Delay per replayed round so a transcript plays back watchably.
const REPLAY_PACING: Duration = Duration::from_millis(200);

pub struct App {
    metrics: SocMetrics,
    stream: SampleStream,
    replay: bool,
}

impl App {
    pub fn new(stream: SampleStream, show_clusters: bool, replay: bool) -> Self {
        Self {
            metrics: SocMetrics::new(show_clusters),
            stream,
            replay,
        }
    }

    pub fn metrics(&self) -> &SocMetrics {
        &self.metrics
    }

    /// Enter the alternate screen and run until the sampler stream ends.
    /// The terminal is restored on every exit path: normal return, error,
    /// panic (hook), and Ctrl+C (signal handler).
    pub fn run(&mut self) -> io::Result<()> {
        // Raw mode stays off: the dashboard takes no keyboard input, and
        // Ctrl+C must keep reaching the process as SIGINT.
        ctrlc::set_handler(|| {
            let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
            std::process::exit(0);
        })
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook(); // remove our hook
        execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        // First frame goes up before any data arrives.
        terminal.draw(|f| super::ui::draw(f, self))?;

        while let Some(line) = self.stream.next_line()? {
            if self.metrics.apply_line(&line) {
                terminal.draw(|f| super::ui::draw(f, self))?;
                if self.replay {
                    thread::sleep(REPLAY_PACING);
                }
            }
        }

        // A boundary line opens a round, so the last completed round is
        // still unpainted when the stream ends.
        terminal.draw(|f| super::ui::draw(f, self))?;
        Ok(())
    }
}

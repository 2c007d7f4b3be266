//! Pure stopwatch logic with no platform dependencies.
//! Every time-dependent call takes `now_ms` from the caller's monotonic clock.

mod format;

pub use format::{format_hms, DisplayFormat, DurationFields, FormatError, Template, Unit};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerState {
    Initialized,
    Started,
    Stopped,
}

/// Start/stop/reset state machine accumulating elapsed time across pauses.
///
/// Misuse is absorbed: `start` while running and `stop` while not running
/// are no-ops, and `reset` always succeeds.
#[derive(Clone, Debug)]
pub struct Stopwatch {
    state: TimerState,
    started_at: Option<u64>,
    paused_offset_ms: u64,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: TimerState::Initialized,
            started_at: None,
            paused_offset_ms: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Started
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn paused_offset_ms(&self) -> u64 {
        self.paused_offset_ms
    }

    pub fn start(&mut self, now_ms: u64) {
        if self.state == TimerState::Started {
            return;
        }
        self.started_at = Some(now_ms);
        self.state = TimerState::Started;
    }

    pub fn stop(&mut self, now_ms: u64) {
        let Some(started_at) = self.started_at.take() else {
            return;
        };
        self.paused_offset_ms += now_ms.saturating_sub(started_at);
        self.state = TimerState::Stopped;
    }

    pub fn reset(&mut self) {
        self.paused_offset_ms = 0;
        self.started_at = None;
        self.state = TimerState::Initialized;
    }

    /// Stop when running, start otherwise. Returns the resulting state.
    pub fn toggle(&mut self, now_ms: u64) -> TimerState {
        if self.is_running() {
            self.stop(now_ms);
        } else {
            self.start(now_ms);
        }
        self.state
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.started_at {
            Some(started_at) => self.paused_offset_ms + now_ms.saturating_sub(started_at),
            None => self.paused_offset_ms,
        }
    }

    /// Render the elapsed time through a template string such as `"hh:mm:ss.SSS"`.
    pub fn formatted_elapsed(&self, now_ms: u64, template: &str) -> Result<String, FormatError> {
        let template = Template::parse(template)?;
        Ok(template.render(self.elapsed_ms(now_ms)))
    }

    pub fn render(&self, now_ms: u64, format: &DisplayFormat) -> String {
        format.render(self.elapsed_ms(now_ms))
    }
}

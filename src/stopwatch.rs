use stopwatch_core::{DisplayFormat, Stopwatch, TimerState};

/// The one stopwatch the app shows, plus what is currently on screen.
pub struct StopwatchState {
    pub timer: Stopwatch,
    format: DisplayFormat,
    display: String,
}

impl StopwatchState {
    pub fn new(format: DisplayFormat) -> Self {
        let display = format.render(0);
        Self {
            timer: Stopwatch::new(),
            format,
            display,
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn start_or_stop(&mut self, now_ms: u64) -> TimerState {
        let state = self.timer.toggle(now_ms);
        self.refresh(now_ms);
        state
    }

    pub fn reset(&mut self, now_ms: u64) {
        self.timer.reset();
        self.refresh(now_ms);
    }

    pub fn set_format(&mut self, format: DisplayFormat, now_ms: u64) {
        self.format = format;
        self.refresh(now_ms);
    }

    pub fn refresh(&mut self, now_ms: u64) -> &str {
        self.display = self.timer.render(now_ms, &self.format);
        &self.display
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_running() {
            "Pause"
        } else {
            "Start"
        }
    }
}

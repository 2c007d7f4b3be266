use std::io::{self, Write};

use crate::settings::Settings;
use crate::stopwatch::StopwatchState;

// Carriage return plus erase-line, so each draw replaces the previous one.
const CLEAR_LINE: &str = "\r\x1b[2K";

pub fn clear_line(out: &mut impl Write) -> io::Result<()> {
    write!(out, "{}", CLEAR_LINE)
}

pub fn draw_stopwatch(out: &mut impl Write, state: &StopwatchState) -> io::Result<()> {
    clear_line(out)?;
    write!(out, "{}   [{}] [Reset]", state.display(), state.button_label())?;
    out.flush()
}

/// Print a message on its own line; the next draw starts a fresh line below it.
pub fn draw_notice(out: &mut impl Write, message: &str) -> io::Result<()> {
    clear_line(out)?;
    writeln!(out, "{}", message)?;
    out.flush()
}

pub fn draw_help(out: &mut impl Write, help_text: &str, settings: &Settings) -> io::Result<()> {
    clear_line(out)?;
    writeln!(out, "STOPWATCH")?;
    for line in help_text.lines() {
        writeln!(out, "  {}", line)?;
    }
    writeln!(out, "interval: {} ms   format: {}", settings.interval, settings.format)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stopwatch_core::DisplayFormat;

    #[test]
    fn test_draw_stopwatch() {
        let mut state = StopwatchState::new(DisplayFormat::parse("mm:ss").unwrap());
        let mut out = Vec::new();
        draw_stopwatch(&mut out, &state).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\r\x1b[2K00:00   [Start] [Reset]");

        state.start_or_stop(0);
        state.refresh(61_000);
        let mut out = Vec::new();
        draw_stopwatch(&mut out, &state).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\r\x1b[2K01:01   [Pause] [Reset]");
    }

    #[test]
    fn test_draw_notice() {
        let mut out = Vec::new();
        draw_notice(&mut out, "hello").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\r\x1b[2Khello\n");
    }

    #[test]
    fn test_draw_help_shows_settings() {
        let mut out = Vec::new();
        draw_help(&mut out, "a\nb", &Settings::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  a\n  b\n"));
        assert!(text.contains("interval: 100 ms   format: hh:mm:ss.SSS"));
    }
}

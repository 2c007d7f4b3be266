/// A user action typed on one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartStop,
    Reset,
    Interval(String),
    Format(String),
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Long names match the command palette ids.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };
        match word {
            "" | "s" | "start-stop-stopwatch" => Some(Command::StartStop),
            "r" | "reset-stopwatch" => Some(Command::Reset),
            "i" | "interval" => Some(Command::Interval(arg.to_string())),
            "f" | "format" => Some(Command::Format(arg.to_string())),
            "h" | "?" | "help" => Some(Command::Help),
            "q" | "quit" => Some(Command::Quit),
            _ => None,
        }
    }
}

pub const HELP_TEXT: &str = "\
ENTER or s    start / pause
r             reset
i <1-1000>    refresh interval in ms
f <format>    time format, e.g. hh:mm:ss.SSS
h             this help
q             quit";

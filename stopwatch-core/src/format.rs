//! Duration templates such as `hh:mm:ss.SSS`.

use std::fmt::{self, Write};

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Token letters that name calendar units a plain duration cannot represent.
const CALENDAR_TOKENS: [char; 5] = ['y', 'Y', 'M', 'w', 'W'];

#[derive(Clone, Copy, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum Unit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl Unit {
    fn from_token(token: char) -> Option<Self> {
        match token {
            'd' | 'D' => Some(Unit::Day),
            'h' | 'H' => Some(Unit::Hour),
            'm' => Some(Unit::Minute),
            's' => Some(Unit::Second),
            'S' => Some(Unit::Millisecond),
            _ => None,
        }
    }

    pub fn token(self) -> char {
        match self {
            Unit::Day => 'd',
            Unit::Hour => 'h',
            Unit::Minute => 'm',
            Unit::Second => 's',
            Unit::Millisecond => 'S',
        }
    }

    pub fn millis(self) -> u64 {
        match self {
            Unit::Day => MS_PER_DAY,
            Unit::Hour => MS_PER_HOUR,
            Unit::Minute => MS_PER_MINUTE,
            Unit::Second => MS_PER_SECOND,
            Unit::Millisecond => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatError {
    Empty,
    NoFields,
    UnterminatedEscape { position: usize },
    DuplicateField { unit: Unit, position: usize },
    UnsupportedToken { token: char, position: usize },
    /// Text handed to [`Template::scan`] does not match the template.
    Mismatch { position: usize },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatError::Empty => write!(f, "format is empty"),
            FormatError::NoFields => write!(f, "format contains no duration fields"),
            FormatError::UnterminatedEscape { position } => {
                write!(f, "unterminated '[' escape at {}", position)
            }
            FormatError::DuplicateField { unit, position } => {
                write!(f, "field '{}' repeated at {}", unit.token(), position)
            }
            FormatError::UnsupportedToken { token, position } => {
                write!(f, "unsupported token '{}' at {}", token, position)
            }
            FormatError::Mismatch { position } => {
                write!(f, "text does not match format at {}", position)
            }
        }
    }
}

impl std::error::Error for FormatError {}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { unit: Unit, width: usize },
}

/// Per-unit values of a duration split against a template.
/// Units absent from the template are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DurationFields {
    pub days: Option<u64>,
    pub hours: Option<u64>,
    pub minutes: Option<u64>,
    pub seconds: Option<u64>,
    pub millis: Option<u64>,
}

impl DurationFields {
    pub fn get(&self, unit: Unit) -> Option<u64> {
        match unit {
            Unit::Day => self.days,
            Unit::Hour => self.hours,
            Unit::Minute => self.minutes,
            Unit::Second => self.seconds,
            Unit::Millisecond => self.millis,
        }
    }

    fn slot(&mut self, unit: Unit) -> &mut Option<u64> {
        match unit {
            Unit::Day => &mut self.days,
            Unit::Hour => &mut self.hours,
            Unit::Minute => &mut self.minutes,
            Unit::Second => &mut self.seconds,
            Unit::Millisecond => &mut self.millis,
        }
    }

    pub fn total_ms(&self) -> u64 {
        [Unit::Day, Unit::Hour, Unit::Minute, Unit::Second, Unit::Millisecond]
            .iter()
            .map(|&unit| self.get(unit).unwrap_or(0) * unit.millis())
            .sum()
    }
}

/// A parsed duration template.
///
/// Runs of `d`/`D`, `h`/`H`, `m`, `s` or `S` are fields whose run length is the
/// minimum digit count. The largest field present absorbs all larger units,
/// so `mm:ss` renders two hours as `120:00`. Text inside `[...]` is literal,
/// as is any other character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    // Descending, largest unit first.
    units: Vec<Unit>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, FormatError> {
        if source.is_empty() {
            return Err(FormatError::Empty);
        }

        let mut segments = Vec::new();
        let mut units: Vec<Unit> = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            if c == '[' {
                let mut closed = false;
                for (_, escaped) in chars.by_ref() {
                    if escaped == ']' {
                        closed = true;
                        break;
                    }
                    literal.push(escaped);
                }
                if !closed {
                    return Err(FormatError::UnterminatedEscape { position });
                }
                continue;
            }

            if let Some(unit) = Unit::from_token(c) {
                let mut width = 1;
                while chars.next_if(|&(_, next)| next == c).is_some() {
                    width += 1;
                }
                if units.contains(&unit) {
                    return Err(FormatError::DuplicateField { unit, position });
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field { unit, width });
                units.push(unit);
                continue;
            }

            if CALENDAR_TOKENS.contains(&c) {
                return Err(FormatError::UnsupportedToken { token: c, position });
            }
            literal.push(c);
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        if units.is_empty() {
            return Err(FormatError::NoFields);
        }
        units.sort_unstable_by(|a, b| b.cmp(a));

        Ok(Self {
            source: source.to_string(),
            segments,
            units,
        })
    }

    /// `hh:mm:ss`, with `.SSS` appended when `show_milliseconds` is set.
    pub fn fixed(show_milliseconds: bool) -> Self {
        let source = if show_milliseconds { "hh:mm:ss.SSS" } else { "hh:mm:ss" };
        let pair = |unit| Segment::Field { unit, width: 2 };
        let colon = || Segment::Literal(":".to_string());
        let mut segments = vec![pair(Unit::Hour), colon(), pair(Unit::Minute), colon(), pair(Unit::Second)];
        let mut units = vec![Unit::Hour, Unit::Minute, Unit::Second];
        if show_milliseconds {
            segments.push(Segment::Literal(".".to_string()));
            segments.push(Segment::Field { unit: Unit::Millisecond, width: 3 });
            units.push(Unit::Millisecond);
        }
        Self {
            source: source.to_string(),
            segments,
            units,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Split `elapsed_ms` across the units this template shows.
    pub fn split(&self, elapsed_ms: u64) -> DurationFields {
        let mut fields = DurationFields::default();
        let mut remaining = elapsed_ms;
        for &unit in &self.units {
            *fields.slot(unit) = Some(remaining / unit.millis());
            remaining %= unit.millis();
        }
        fields
    }

    pub fn render(&self, elapsed_ms: u64) -> String {
        let fields = self.split(elapsed_ms);
        let mut out = String::with_capacity(self.source.len() + 4);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { unit, width } => {
                    let value = fields.get(*unit).unwrap_or(0);
                    // Writing to a String cannot fail.
                    let _ = write!(out, "{:0width$}", value, width = *width);
                }
            }
        }
        out
    }

    /// Digits the segments from `start` claim before the next non-digit:
    /// the widths of adjacent fields plus any leading digits of the literal after them.
    fn trailing_digits(&self, start: usize) -> usize {
        let mut total = 0;
        for segment in &self.segments[start.min(self.segments.len())..] {
            match segment {
                Segment::Field { width, .. } => total += width,
                Segment::Literal(literal) => {
                    total += literal.bytes().take_while(u8::is_ascii_digit).count();
                    break;
                }
            }
        }
        total
    }

    /// Read a rendered string back into its field values.
    pub fn scan(&self, text: &str) -> Result<DurationFields, FormatError> {
        let mut fields = DurationFields::default();
        let mut rest = text;

        for (i, segment) in self.segments.iter().enumerate() {
            let position = text.len() - rest.len();
            match segment {
                Segment::Literal(literal) => {
                    rest = rest
                        .strip_prefix(literal.as_str())
                        .ok_or(FormatError::Mismatch { position })?;
                }
                Segment::Field { unit, width } => {
                    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
                    // Inside a run of adjacent fields only the first may
                    // overflow its width; the rest read exactly their width.
                    let take = match i.checked_sub(1).map(|prev| &self.segments[prev]) {
                        Some(Segment::Field { .. }) if digits >= *width => *width,
                        Some(Segment::Field { .. }) => 0,
                        _ => digits.saturating_sub(self.trailing_digits(i + 1)),
                    };
                    if take == 0 {
                        return Err(FormatError::Mismatch { position });
                    }
                    let value = rest[..take]
                        .parse::<u64>()
                        .map_err(|_| FormatError::Mismatch { position })?;
                    *fields.slot(*unit) = Some(value);
                    rest = &rest[take..];
                }
            }
        }

        if !rest.is_empty() {
            return Err(FormatError::Mismatch {
                position: text.len() - rest.len(),
            });
        }
        Ok(fields)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// How the elapsed time is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayFormat {
    Template(Template),
    Fixed { show_milliseconds: bool },
}

impl DisplayFormat {
    pub fn parse(source: &str) -> Result<Self, FormatError> {
        Template::parse(source).map(DisplayFormat::Template)
    }

    pub fn render(&self, elapsed_ms: u64) -> String {
        match self {
            DisplayFormat::Template(template) => template.render(elapsed_ms),
            DisplayFormat::Fixed { show_milliseconds } => {
                let hms = format_hms(elapsed_ms);
                if *show_milliseconds {
                    format!("{}.{:03}", hms, elapsed_ms % 1000)
                } else {
                    hms
                }
            }
        }
    }
}

/// Format milliseconds as "HH:MM:SS" with uncapped hours.
pub fn format_hms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let t = Template::parse("hh:mm:ss.SSS").unwrap();
        assert_eq!(t.render(0), "00:00:00.000");
        assert_eq!(t.render(1500), "00:00:01.500");
        assert_eq!(t.render(3_723_004), "01:02:03.004");
    }

    #[test]
    fn test_hours_not_capped() {
        let t = Template::parse("hh:mm:ss").unwrap();
        assert_eq!(t.render(100 * MS_PER_HOUR), "100:00:00");
    }

    #[test]
    fn test_largest_field_absorbs() {
        let t = Template::parse("mm:ss").unwrap();
        assert_eq!(t.render(2 * MS_PER_HOUR), "120:00");

        let t = Template::parse("d [days] hh:mm").unwrap();
        assert_eq!(t.render(MS_PER_DAY + 90 * MS_PER_MINUTE), "1 days 01:30");
    }

    #[test]
    fn test_uppercase_tokens() {
        let t = Template::parse("HH:mm:ss").unwrap();
        assert_eq!(t.render(3_725_000), "01:02:05");
        let t = Template::parse("D [d] HH").unwrap();
        assert_eq!(t.render(MS_PER_DAY + 3 * MS_PER_HOUR), "1 d 03");
        assert_eq!(
            Template::parse("HH:hh"),
            Err(FormatError::DuplicateField { unit: Unit::Hour, position: 3 })
        );
    }

    #[test]
    fn test_gap_between_fields() {
        // No minutes field: seconds carry the minutes.
        let t = Template::parse("hh:ss").unwrap();
        assert_eq!(t.render(MS_PER_HOUR + 61 * MS_PER_SECOND), "01:61");
    }

    #[test]
    fn test_truncates_below_smallest_field() {
        let t = Template::parse("hh:mm:ss").unwrap();
        assert_eq!(t.render(1999), "00:00:01");
    }

    #[test]
    fn test_single_letter_fields_unpadded() {
        let t = Template::parse("m:ss").unwrap();
        assert_eq!(t.render(65_000), "1:05");
        let t = Template::parse("s.S").unwrap();
        assert_eq!(t.render(1007), "1.7");
    }

    #[test]
    fn test_escapes() {
        let t = Template::parse("[hms] ss[s]").unwrap();
        assert_eq!(t.render(42_000), "hms 42s");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Template::parse(""), Err(FormatError::Empty));
        assert_eq!(Template::parse("::"), Err(FormatError::NoFields));
        assert_eq!(Template::parse("[hh]"), Err(FormatError::NoFields));
        assert_eq!(
            Template::parse("hh:[mm"),
            Err(FormatError::UnterminatedEscape { position: 3 })
        );
        assert_eq!(
            Template::parse("hh:mm:hh"),
            Err(FormatError::DuplicateField { unit: Unit::Hour, position: 6 })
        );
        assert_eq!(
            Template::parse("yy hh"),
            Err(FormatError::UnsupportedToken { token: 'y', position: 0 })
        );
        assert_eq!(
            Template::parse("YYYY hh"),
            Err(FormatError::UnsupportedToken { token: 'Y', position: 0 })
        );
        assert_eq!(
            Template::parse("hh W"),
            Err(FormatError::UnsupportedToken { token: 'W', position: 3 })
        );
    }

    #[test]
    fn test_fixed_layout() {
        let plain = DisplayFormat::Fixed { show_milliseconds: false };
        let millis = DisplayFormat::Fixed { show_milliseconds: true };
        assert_eq!(plain.render(65_123), "00:01:05");
        assert_eq!(millis.render(65_123), "00:01:05.123");
        assert_eq!(plain.render(30 * MS_PER_HOUR), "30:00:00");
    }

    #[test]
    fn test_fixed_template_matches_fixed_layout() {
        for &ms in [0u64, 999, 65_123, 3_600_000, 360_000_042].iter() {
            for &show in [false, true].iter() {
                let layout = DisplayFormat::Fixed { show_milliseconds: show };
                assert_eq!(Template::fixed(show).render(ms), layout.render(ms));
                assert_eq!(Template::fixed(show), Template::parse(Template::fixed(show).as_str()).unwrap());
            }
        }
    }

    #[test]
    fn test_scan_recovers_fields() {
        let t = Template::parse("hh:mm:ss.SSS").unwrap();
        for &ms in [0u64, 1500, 59_999, 3_723_004, 400 * MS_PER_HOUR + 7].iter() {
            let rendered = t.render(ms);
            let fields = t.scan(&rendered).unwrap();
            assert_eq!(fields, t.split(ms));
            assert_eq!(fields.total_ms(), ms);
        }
    }

    #[test]
    fn test_scan_adjacent_fields() {
        let t = Template::parse("hhmmss").unwrap();
        let fields = t.scan(&t.render(3_723_000)).unwrap();
        assert_eq!(fields.hours, Some(1));
        assert_eq!(fields.minutes, Some(2));
        assert_eq!(fields.seconds, Some(3));
        assert_eq!(fields.millis, None);
    }

    #[test]
    fn test_scan_adjacent_fields_with_overflowing_hours() {
        let t = Template::parse("hhmmss").unwrap();
        let ms = 100 * MS_PER_HOUR + 2 * MS_PER_MINUTE + 3 * MS_PER_SECOND;
        let rendered = t.render(ms);
        assert_eq!(rendered, "1000203");
        let fields = t.scan(&rendered).unwrap();
        assert_eq!(fields.hours, Some(100));
        assert_eq!(fields.total_ms(), ms);

        let t = Template::parse("hhmm[0]").unwrap();
        let fields = t.scan(&t.render(123 * MS_PER_HOUR + 4 * MS_PER_MINUTE)).unwrap();
        assert_eq!(fields.hours, Some(123));
        assert_eq!(fields.minutes, Some(4));
    }

    #[test]
    fn test_scan_mismatch() {
        let t = Template::parse("hh:mm").unwrap();
        assert_eq!(t.scan("01-02"), Err(FormatError::Mismatch { position: 2 }));
        assert_eq!(t.scan("01:02x"), Err(FormatError::Mismatch { position: 5 }));
        assert_eq!(t.scan(":02"), Err(FormatError::Mismatch { position: 0 }));
    }
}

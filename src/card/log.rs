/// Styling of a backend log line, decided by its leading marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    Error,
    Warning,
    Todo,
    /// Section markers emitted as `&[...]`
    Marker,
    Plain,
}

impl LogStyle {
    /// Checked in this order; the first marker found wins.
    const MARKERS: [(&'static str, LogStyle); 4] = [
        ("(err)", LogStyle::Error),
        ("(warn)", LogStyle::Warning),
        ("(todo)", LogStyle::Todo),
        ("&[", LogStyle::Marker),
    ];

    /// Classify a line by its marker, ignoring surrounding whitespace.
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        Self::MARKERS
            .iter()
            .find(|(marker, _)| trimmed.starts_with(*marker))
            .map(|(_, style)| *style)
            .unwrap_or(LogStyle::Plain)
    }

    /// Opening and closing markup wrapped around a line of this style
    pub fn tags(self) -> Option<(&'static str, &'static str)> {
        match self {
            LogStyle::Error => Some(("<span style='color: red'>", "</span>")),
            LogStyle::Warning => Some(("<span style='color: #e0bb00'>", "</span>")),
            LogStyle::Todo => Some(("<span style='color: #00a2da'>", "</span>")),
            LogStyle::Marker => Some(("<small><b style='color: #0016ff'>", "</b></small>")),
            LogStyle::Plain => None,
        }
    }

    /// Emit `content` wrapped in this style's markup
    pub fn wrap(self, content: &str) -> String {
        match self.tags() {
            Some((open, close)) => format!("{}{}{}", open, content, close),
            None => content.to_string(),
        }
    }
}

use crate::core::error::ExtractionError;
use std::fs;
use std::path::Path;

/// The text of one log file, held as lines with the newline stripped.
///
/// Provides the two views the extractors need: a forward pass over every
/// line and a trailing window covering the last fraction of the file.
#[derive(Debug, Clone)]
pub struct LogText {
    lines: Vec<String>,
}

impl LogText {
    pub fn read(path: &Path) -> Result<Self, ExtractionError> {
        let bytes = fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // GAMESS occasionally leaves non-UTF-8 bytes in banners.
        let text = String::from_utf8_lossy(&bytes);
        Ok(Self::from_text(&text))
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(|l| l.trim_end_matches('\r').to_string()).collect(),
        }
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &str> + Clone + '_ {
        self.lines.iter().map(String::as_str)
    }

    /// The last `fraction` of the lines (at least one line for a non-empty
    /// log). A fraction of 1.0 or more yields the whole file.
    pub fn tail(&self, fraction: f64) -> impl DoubleEndedIterator<Item = &str> + Clone + '_ {
        let total = self.lines.len();
        let keep = if fraction >= 1.0 {
            total
        } else {
            ((total as f64 * fraction.max(0.0)).ceil() as usize).clamp(total.min(1), total)
        };
        self.lines[total - keep..].iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_the_trailing_fraction() {
        let text = LogText::from_text("1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n");
        let tail: Vec<_> = text.tail(0.2).collect();
        assert_eq!(tail, vec!["9", "10"]);
        assert_eq!(text.tail(1.0).count(), 10);
        assert_eq!(text.tail(0.01).collect::<Vec<_>>(), vec!["10"]);
    }

    #[test]
    fn blank_lines_survive_as_empty_strings() {
        let text = LogText::from_text("a\r\n\r\nb\n");
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["a", "", "b"]);
    }

    #[test]
    fn empty_log_has_empty_tail() {
        let text = LogText::from_text("");
        assert_eq!(text.lines().count(), 0);
        assert_eq!(text.tail(0.2).count(), 0);
    }
}

//! Splits streamed model text into complete diagnostic lines

use dermal_common::log_line::has_log_prefix;

/// Unstructured lines at or below this many characters are dropped
pub const MIN_UNSTRUCTURED_LINE_LEN: usize = 5;

/// Holds text after the last newline until more arrives
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the trimmed, non-empty lines it completes
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.pending.push_str(fragment);

        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };

        let remainder = self.pending.split_off(last_newline + 1);
        let completed = std::mem::replace(&mut self.pending, remainder);

        completed
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Remaining partial line, trimmed, if non-empty
    pub fn finish(self) -> Option<String> {
        let rest = self.pending.trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }
}

/// Whether a completed line is worth showing as a log entry
///
/// Lines with the timestamp-tag prefix always pass. Other text passes only
/// when longer than `MIN_UNSTRUCTURED_LINE_LEN` characters, which drops
/// stray fragments such as list markers.
pub fn is_displayable(line: &str) -> bool {
    has_log_prefix(line) || line.trim().chars().count() > MIN_UNSTRUCTURED_LINE_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_emitted_on_newline() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push("08:34:51 [OK] AUTH").is_empty());
        assert_eq!(
            buffer.push("ENTICATING\n08:34:51 [..] UV"),
            vec!["08:34:51 [OK] AUTHENTICATING".to_string()]
        );
        assert_eq!(
            buffer.push("_MAPPING\n\n08:34:52 [!!] X\n"),
            vec!["08:34:51 [..] UV_MAPPING".to_string(), "08:34:52 [!!] X".to_string()]
        );
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_finish_flushes_partial_line() {
        let mut buffer = LineBuffer::new();
        buffer.push("08:34:51 [OK] A\n08:34:53 [..] CALCULATING");
        assert_eq!(buffer.finish().as_deref(), Some("08:34:53 [..] CALCULATING"));
    }

    #[test]
    fn test_blank_and_whitespace_lines_skipped() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push("\n   \n\t\n").is_empty());
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_crlf_trimmed() {
        let mut buffer = LineBuffer::new();
        assert_eq!(
            buffer.push("08:34:51 [OK] A\r\n"),
            vec!["08:34:51 [OK] A".to_string()]
        );
    }

    #[test]
    fn test_displayable_filter() {
        assert!(is_displayable("08:34:51 [OK] A"));
        assert!(is_displayable("Analysis starting now"));
        assert!(!is_displayable("---"));
        assert!(!is_displayable("12345"));
        assert!(is_displayable("123456"));
    }
}

use std::path::Path;

use thiserror::Error;

pub(crate) const DEFAULT_SEPARATOR: char = ',';
pub(crate) const DEFAULT_URI_PREFIXES: &[&str] = &["http"];

const QUOTE: char = '"';
const BOM: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file is not valid UTF-8 (byte {valid_up_to})")]
    Decode { valid_up_to: usize },

    #[error("too many links: {count} (limit {max})")]
    TooManyLinks { count: usize, max: u32 },
}

/// How a link file is split into links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFileFormat {
    pub separator: char,
    /// Lines starting with one of these (ASCII case-insensitive) are taken
    /// whole, even when they contain the separator.
    pub uri_prefixes: Vec<String>,
}

impl Default for LinkFileFormat {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            uri_prefixes: DEFAULT_URI_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }
}

impl LinkFileFormat {
    fn is_uri(&self, line: &str) -> bool {
        self.uri_prefixes.iter().any(|p| {
            line.len() >= p.len()
                && line.is_char_boundary(p.len())
                && line[..p.len()].eq_ignore_ascii_case(p)
        })
    }

    /// Split `text` into links: trim, strip quotes, split non-URI lines on the
    /// separator, drop empties. Order and duplicates are preserved.
    ///
    /// Lines end at `\n`, `\r\n` or a bare `\r`.
    pub fn parse(&self, text: &str) -> Vec<String> {
        let mut links = Vec::new();
        for line in text.split(['\n', '\r']) {
            let line = clean(line);
            if line.is_empty() {
                continue;
            }
            if !self.is_uri(line) && line.contains(self.separator) {
                links.extend(
                    line.split(self.separator)
                        .map(clean)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                );
            } else {
                links.push(line.to_string());
            }
        }
        links
    }
}

fn clean(s: &str) -> &str {
    s.trim().trim_matches(QUOTE).trim()
}

/// Decode raw file bytes as UTF-8, dropping a leading byte-order mark.
pub fn decode_link_file(bytes: &[u8]) -> Result<&str, LoadError> {
    let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Decode {
        valid_up_to: e.valid_up_to(),
    })?;
    Ok(text.strip_prefix(BOM).unwrap_or(text))
}

pub fn read_link_file(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_link_file(&bytes).map(str::to_string)
}

/// Ordered links plus the index of the next one to write.
///
/// The cursor stays in `[0, len]`; it only moves forward through
/// [`LinkQueue::advance`] and back to zero through `load`/`reset`.
#[derive(Debug, Default, Clone)]
pub struct LinkQueue {
    links: Vec<String>,
    cursor: usize,
}

impl LinkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with the links parsed from `text` and rewind.
    pub fn load(&mut self, text: &str, format: &LinkFileFormat) -> usize {
        self.load_links(format.parse(text))
    }

    pub fn load_links(&mut self, links: Vec<String>) -> usize {
        self.links = links;
        self.cursor = 0;
        self.links.len()
    }

    pub fn current(&self) -> Option<&str> {
        self.links.get(self.cursor).map(String::as_str)
    }

    pub fn advance(&mut self) {
        if self.cursor < self.links.len() {
            self.cursor += 1;
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn remaining(&self) -> usize {
        self.links.len().saturating_sub(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.links.len()
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<String> {
        LinkFileFormat::default().parse(text)
    }

    #[test]
    fn parses_mixed_lines() {
        assert_eq!(
            parse("http://a.com\nb.com,c.com\n\"d.com\""),
            vec!["http://a.com", "b.com", "c.com", "d.com"]
        );
    }

    #[test]
    fn uri_lines_are_not_split() {
        assert_eq!(
            parse("https://x.com/?q=1,2\nHTTP://y.com/a,b"),
            vec!["https://x.com/?q=1,2", "HTTP://y.com/a,b"]
        );
    }

    #[test]
    fn blank_lines_and_empty_cells_are_dropped() {
        assert_eq!(
            parse("\n  \r\na.com,, ,b.com\n\"\"\n"),
            vec!["a.com", "b.com"]
        );
    }

    #[test]
    fn quoted_csv_cells_are_cleaned() {
        assert_eq!(
            parse("\"a.com\",\"b.com\"\r\n"),
            vec!["a.com", "b.com"]
        );
    }

    #[test]
    fn cr_only_and_mixed_line_endings_split() {
        assert_eq!(parse("a.com\rb.com\rc.com"), vec!["a.com", "b.com", "c.com"]);
        assert_eq!(
            parse("a.com\r\nb.com\nc.com\rd.com,e.com\r"),
            vec!["a.com", "b.com", "c.com", "d.com", "e.com"]
        );
        assert_eq!(
            parse("\"https://x.io/1\"\r\"https://x.io/2\"\r\n"),
            vec!["https://x.io/1", "https://x.io/2"]
        );
    }

    #[test]
    fn duplicates_and_order_are_kept() {
        assert_eq!(parse("b.com\na.com\nb.com"), vec!["b.com", "a.com", "b.com"]);
    }

    #[test]
    fn custom_separator_and_prefixes() {
        let format = LinkFileFormat {
            separator: ';',
            uri_prefixes: vec!["tel:".to_string()],
        };
        assert_eq!(
            format.parse("a.com;b.com\ntel:1;2\nhttp://x;y"),
            vec!["a.com", "b.com", "tel:1;2", "http://x", "y"]
        );
    }

    #[test]
    fn load_sets_count_and_rewinds() {
        let mut q = LinkQueue::new();
        assert_eq!(q.load("a\nb\nc", &LinkFileFormat::default()), 3);
        q.advance();
        q.advance();
        assert_eq!(q.cursor(), 2);

        assert_eq!(q.load("x\ny", &LinkFileFormat::default()), 2);
        assert_eq!(q.cursor(), 0);
        assert_eq!(q.current(), Some("x"));
    }

    #[test]
    fn advance_walks_to_exhaustion_and_stops() {
        let mut q = LinkQueue::new();
        q.load("a\nb\nc", &LinkFileFormat::default());
        for (k, expected) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(q.current(), Some(*expected));
            assert_eq!(q.remaining(), 3 - k);
            q.advance();
        }
        assert_eq!(q.current(), None);
        assert!(q.is_exhausted());
        q.advance();
        assert_eq!(q.cursor(), 3);
        assert_eq!(q.remaining(), 0);
    }

    #[test]
    fn reset_rewinds_without_touching_links() {
        let mut q = LinkQueue::new();
        q.load("a\nb", &LinkFileFormat::default());
        q.advance();
        q.reset();
        assert_eq!(q.cursor(), 0);
        assert_eq!(q.links(), ["a", "b"]);
    }

    #[test]
    fn empty_queue_has_nothing_current() {
        let q = LinkQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.current(), None);
        assert_eq!(q.remaining(), 0);
    }

    #[test]
    fn decode_strips_bom_and_rejects_invalid_utf8() {
        assert_eq!(decode_link_file(b"\xef\xbb\xbfa.com").unwrap(), "a.com");
        assert!(matches!(
            decode_link_file(b"a.com\n\xff"),
            Err(LoadError::Decode { valid_up_to: 6 })
        ));
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_link_file(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

//! Path pattern matching module
//!
//! Patterns are slash-separated literals and `<name>` / `<slug:name>`
//! placeholders, e.g. `/category/<slug:category>/add_page/`.

/// Placeholder converters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Converter {
    /// Any non-empty segment
    Str,
    /// ASCII letters, digits, `-` and `_`
    Slug,
}

impl Converter {
    fn accepts(self, segment: &str) -> bool {
        if segment.is_empty() {
            return false;
        }
        match self {
            Self::Str => true,
            Self::Slug => segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
        }
    }
}

/// Parse a `<...>` placeholder, returning `None` for literal segments
fn placeholder(segment: &str) -> Option<Converter> {
    let inner = segment.strip_prefix('<')?.strip_suffix('>')?;
    match inner.split_once(':') {
        Some(("slug", _)) => Some(Converter::Slug),
        _ => Some(Converter::Str),
    }
}

/// Match a path against a pattern, returning captured parameters in order
pub fn match_path(pattern: &str, path: &str) -> Option<Vec<String>> {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    let mut params = Vec::new();

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(expected), Some(actual)) => match placeholder(expected) {
                Some(converter) => {
                    if !converter.accepts(actual) {
                        return None;
                    }
                    params.push(actual.to_string());
                }
                None => {
                    if expected != actual {
                        return None;
                    }
                }
            },
            _ => return None,
        }
    }
}

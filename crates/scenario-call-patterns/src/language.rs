//! Detection of the `# language:` directive.

/// Language tag assumed when a document declares none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Number of leading lines inspected for a language directive.
pub const LANGUAGE_SCAN_LINES: usize = 10;

const DIRECTIVE: &str = "language:";

/// Unicode byte-order mark some editors write at the start of UTF-8 files.
pub const BYTE_ORDER_MARK: char = '\u{feff}';

/// `text` without a leading byte-order mark.
///
/// # Examples
///
/// ```
/// use scenario_call_patterns::strip_byte_order_mark;
///
/// assert_eq!(strip_byte_order_mark("\u{feff}Feature: X"), "Feature: X");
/// assert_eq!(strip_byte_order_mark("Feature: X"), "Feature: X");
/// ```
#[must_use]
pub fn strip_byte_order_mark(text: &str) -> &str {
    text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text)
}

/// Return the language tag declared by a feature document.
///
/// Only the leading comment block is considered: scanning stops at the first
/// non-blank line that is not a comment, and at most
/// [`LANGUAGE_SCAN_LINES`] lines are read. The directive keyword is matched
/// case-insensitively and may be separated from the `#` by whitespace. The
/// tag itself is returned verbatim; an empty tag or a missing directive
/// yields [`DEFAULT_LANGUAGE`]. A leading byte-order mark is ignored.
///
/// Caller and callee documents are detected independently, so a German
/// feature may call into a French one.
///
/// # Examples
///
/// ```
/// use scenario_call_patterns::detect_language;
///
/// assert_eq!(detect_language("# language: de-DE\nFunktionalität: X"), "de-DE");
/// assert_eq!(detect_language("#Language:fr\nFonctionnalité: X"), "fr");
/// assert_eq!(detect_language("Feature: X\n# language: de"), "en");
/// ```
#[must_use]
pub fn detect_language(text: &str) -> &str {
    for line in strip_byte_order_mark(text)
        .split('\n')
        .take(LANGUAGE_SCAN_LINES)
    {
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix('#') {
            if let Some(tag) = directive_value(comment.trim()) {
                return if tag.is_empty() { DEFAULT_LANGUAGE } else { tag };
            }
            continue;
        }
        if !trimmed.is_empty() {
            break;
        }
    }
    DEFAULT_LANGUAGE
}

fn directive_value(comment: &str) -> Option<&str> {
    let (head, tail) = comment.split_at_checked(DIRECTIVE.len())?;
    head.eq_ignore_ascii_case(DIRECTIVE).then(|| tail.trim())
}

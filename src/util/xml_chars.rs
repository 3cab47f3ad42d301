use std::borrow::Cow;

/// Returns true for characters XML 1.0 does not allow anywhere in a document.
///
/// The C0 range is forbidden except TAB, LF and CR. U+FFFE and U+FFFF are
/// non-characters and forbidden too.
fn is_forbidden(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

/// Removes characters that would make an XML document malformed.
///
/// Feed text frequently comes from pasted content and CMS exports that carry
/// stray control bytes. Those are dropped here rather than escaped, since XML
/// 1.0 has no escape for them.
///
/// Returns `Cow::Borrowed` when the input is already clean, which is the
/// common case; the fast path is a single scan with no allocation.
///
/// # Examples
///
/// ```
/// use feedsmith::util::strip_invalid_xml_chars;
///
/// assert_eq!(strip_invalid_xml_chars("tab\tok"), "tab\tok");
/// assert_eq!(strip_invalid_xml_chars("bell\x07gone"), "bellgone");
/// ```
pub fn strip_invalid_xml_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_forbidden) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_forbidden(c)).collect())
}

fn is_name_start(c: char) -> bool {
    matches!(c,
        ':' | '_' | 'A'..='Z' | 'a'..='z'
        | '\u{c0}'..='\u{d6}'
        | '\u{d8}'..='\u{f6}'
        | '\u{f8}'..='\u{2ff}'
        | '\u{370}'..='\u{37d}'
        | '\u{37f}'..='\u{1fff}'
        | '\u{200c}'..='\u{200d}'
        | '\u{2070}'..='\u{218f}'
        | '\u{2c00}'..='\u{2fef}'
        | '\u{3001}'..='\u{d7ff}'
        | '\u{f900}'..='\u{fdcf}'
        | '\u{fdf0}'..='\u{fffd}'
        | '\u{10000}'..='\u{effff}')
}

fn is_name_char(c: char) -> bool {
    is_name_start(c)
        || matches!(c, '-' | '.' | '0'..='9' | '\u{b7}' | '\u{300}'..='\u{36f}' | '\u{203f}'..='\u{2040}')
}

/// Returns true when `s` is a valid XML 1.0 `Name`, usable as an element
/// name or attribute key.
///
/// # Examples
///
/// ```
/// use feedsmith::util::is_xml_name;
///
/// assert!(is_xml_name("itunes:category"));
/// assert!(!is_xml_name("bad name"));
/// assert!(!is_xml_name("1st"));
/// ```
pub fn is_xml_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => chars.all(is_name_char),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_returns_borrowed() {
        let input = "Hello, world! <p>markup</p> & friends";
        let result = strip_invalid_xml_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_preserves_tabs_newlines_cr() {
        let input = "line1\nline2\ttabbed\r\nwindows";
        let result = strip_invalid_xml_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_removes_c0_controls() {
        let input = "he\x00ll\x07o\x08 w\x0bor\x0cld\x1b!";
        let result = strip_invalid_xml_chars(input);
        assert!(matches!(result, Cow::Owned(_)));
        assert_eq!(result, "hello world!");
    }

    #[test]
    fn test_removes_noncharacters() {
        assert_eq!(strip_invalid_xml_chars("a\u{fffe}b\u{ffff}c"), "abc");
    }

    #[test]
    fn test_unicode_preserved() {
        let input = "日本語 \x01テキスト";
        assert_eq!(strip_invalid_xml_chars(input), "日本語 テキスト");
    }

    #[test]
    fn test_empty_string() {
        let result = strip_invalid_xml_chars("");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "");
    }

    #[test]
    fn test_xml_names() {
        for name in ["ext", "itunes:image", "podcast:person", "_x", "a-b.c1", "caf\u{e9}", "\u{65e5}\u{672c}"] {
            assert!(is_xml_name(name), "{name}");
        }
        for name in ["", "bad name", "1st", "-x", ".x", "a<b", "a&b", "q\"", "tab\tname", "a=b"] {
            assert!(!is_xml_name(name), "{name}");
        }
    }
}

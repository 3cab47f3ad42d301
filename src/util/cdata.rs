/// Opening marker of a CDATA section.
pub const CDATA_OPEN: &str = "<![CDATA[";
/// Closing marker of a CDATA section.
pub const CDATA_CLOSE: &str = "]]>";

/// Strips one top-level CDATA wrapper, if the whole value is wrapped.
///
/// Anything that is not enclosed by exactly one leading [`CDATA_OPEN`] and one
/// trailing [`CDATA_CLOSE`] comes back unchanged.
///
/// # Examples
///
/// ```
/// use feedsmith::util::unwrap_cdata;
///
/// assert_eq!(unwrap_cdata("<![CDATA[<p>Hi</p>]]>"), "<p>Hi</p>");
/// assert_eq!(unwrap_cdata("<p>Hi</p>"), "<p>Hi</p>");
/// ```
pub fn unwrap_cdata(value: &str) -> &str {
    value
        .strip_prefix(CDATA_OPEN)
        .and_then(|rest| rest.strip_suffix(CDATA_CLOSE))
        .unwrap_or(value)
}

/// Wraps a value in a CDATA section without ever nesting markers.
///
/// An already-wrapped value is unwrapped first, so `wrap_cdata(wrap_cdata(s))`
/// equals `wrap_cdata(s)`.
///
/// # Examples
///
/// ```
/// use feedsmith::util::wrap_cdata;
///
/// let once = wrap_cdata("<b>x</b>");
/// assert_eq!(once, "<![CDATA[<b>x</b>]]>");
/// assert_eq!(wrap_cdata(&once), once);
/// ```
pub fn wrap_cdata(value: &str) -> String {
    format!("{CDATA_OPEN}{}{CDATA_CLOSE}", unwrap_cdata(value))
}

/// True when the value holds a character XML would otherwise escape in text.
pub fn needs_escaping(value: &str) -> bool {
    value.bytes().any(|b| b == b'<' || b == b'&')
}

/// Decides whether an (unwrapped) value should be emitted as a CDATA section.
///
/// Requires the scope flag, an escapable character, and no embedded
/// [`CDATA_CLOSE`], which would terminate the section early.
pub fn should_wrap(value: &str, enabled: bool) -> bool {
    enabled && needs_escaping(value) && !value.contains(CDATA_CLOSE)
}

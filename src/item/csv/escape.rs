use std::borrow::Cow;

/// Whether a field must be quoted to survive a round trip.
pub fn needs_quotes(field: &str, separator: char) -> bool {
    field
        .chars()
        .any(|c| c == separator || c == '"' || c == '\r' || c == '\n')
}

/// Quotes `field` when it contains the separator, a quote or a line break.
///
/// Internal quotes are doubled. Fields that need no quoting are borrowed as-is.
///
/// ```
/// use stream_csv_rs::item::csv::escape::escape_field;
///
/// assert_eq!(escape_field("plain", ','), "plain");
/// assert_eq!(escape_field("a,b", ','), "\"a,b\"");
/// assert_eq!(escape_field("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
/// ```
pub fn escape_field(field: &str, separator: char) -> Cow<'_, str> {
    if !needs_quotes(field, separator) {
        return Cow::Borrowed(field);
    }

    let mut escaped = String::with_capacity(field.len() + 2);
    escaped.push('"');
    for c in field.chars() {
        if c == '"' {
            escaped.push('"');
        }
        escaped.push(c);
    }
    escaped.push('"');
    Cow::Owned(escaped)
}

/// Reverses [`escape_field`]: strips surrounding quotes and collapses `""`.
pub fn unescape_field(field: &str) -> Cow<'_, str> {
    match field
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) if inner.contains('"') => Cow::Owned(inner.replace("\"\"", "\"")),
        Some(inner) => Cow::Borrowed(inner),
        None => Cow::Borrowed(field),
    }
}

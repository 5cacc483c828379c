//! Filesystem-safe names for categories, sections, article titles and
//! attachment filenames.

/// Replacement for a name that sanitizes down to nothing.
pub const UNNAMED: &str = "unnamed";

/// Upper bound on a sanitized name, comfortably below the 255-byte limit of
/// common filesystems once an extension is appended.
pub const MAX_FILENAME_BYTES: usize = 200;

/// Turns an arbitrary display name into a single safe path segment.
///
/// - whitespace runs and path separators collapse into a single `_`,
/// - only alphanumerics (any script) and `_`, `.`, `-` are kept, which drops
///   control characters and everything a shell or filesystem treats specially,
/// - leading and trailing `.` and `_` are stripped, so the result is never
///   hidden or a relative-path component,
/// - the result is capped at [`MAX_FILENAME_BYTES`] on a character boundary.
///
/// ```
/// use helpvault_extract::sanitize_filename;
/// assert_eq!(sanitize_filename("Billing"), "Billing");
/// assert_eq!(sanitize_filename("Invoices & Payments: FAQ"), "Invoices_Payments_FAQ");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
/// assert_eq!(sanitize_filename("..."), "unnamed");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let mut output = String::with_capacity(name.len());
    for word in name.split(|c: char| c.is_whitespace() || c == '/' || c == '\\') {
        let word: String = word.chars().filter(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-')).collect();
        if word.is_empty() {
            continue;
        }
        if !output.is_empty() {
            output.push('_');
        }
        output.push_str(&word);
    }
    let capped = &output[..output.floor_char_boundary(MAX_FILENAME_BYTES)];
    match capped.trim_matches(|c: char| c == '.' || c == '_') {
        "" => UNNAMED.to_string(),
        trimmed => trimmed.to_string(),
    }
}

//! Canonical matching keys for free-text feature and rubric names.
//!
//! Source spreadsheets spell the same skill with drifting case and
//! punctuation ("Oral Communication: Active Listening" versus
//! "oral communication - active listening"). [`normalize_key`] folds those
//! variants onto one key so rubric lookups stay stable.

/// Canonicalise `raw` into a matching key.
///
/// The input is trimmed and lowercased, every run of characters that are
/// neither word characters (Unicode alphanumerics or `_`) nor whitespace is
/// replaced by a single space, and internal whitespace collapses to single
/// spaces. The function is total: empty input yields an empty key.
///
/// # Examples
/// ```
/// use pathbuilder_core::normalize_key;
///
/// assert_eq!(
///     normalize_key("  Oral Communication: Active--Listening "),
///     "oral communication active listening"
/// );
/// assert_eq!(normalize_key(""), "");
/// ```
pub fn normalize_key(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut key = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for ch in lowered.chars() {
        if is_word_char(ch) {
            if pending_space && !key.is_empty() {
                key.push(' ');
            }
            pending_space = false;
            key.push(ch);
        } else {
            // Punctuation runs and whitespace runs both collapse to one space.
            pending_space = true;
        }
    }
    key
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

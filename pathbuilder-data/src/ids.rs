//! Occupation identifier clean-up shared by the job loaders.

/// Widest identifier that is left-padded with zeros.
const PADDED_WIDTH: usize = 4;

/// Canonicalise an occupation code read from a CSV source.
///
/// The input is trimmed. When its digits form a code of at most four
/// characters, those digits are zero-padded to four; any other value is
/// returned trimmed. An empty result means the row has no usable id.
///
/// # Examples
/// ```
/// use pathbuilder_data::normalize_job_id;
///
/// assert_eq!(normalize_job_id(" 1 "), "0001");
/// assert_eq!(normalize_job_id("21232"), "21232");
/// assert_eq!(normalize_job_id("  "), "");
/// ```
#[must_use]
pub fn normalize_job_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if !digits.is_empty() && digits.len() <= PADDED_WIDTH {
        format!("{digits:0>PADDED_WIDTH$}")
    } else {
        trimmed.to_owned()
    }
}

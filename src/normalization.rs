//! Normalization of the free-text labels attached to collectible items.

use serde::{Deserialize, Deserializer};
use unicode_normalization::UnicodeNormalization;

/// Trims surrounding whitespace and decomposes the label into Unicode
/// Normalization Form D, so that visually identical labels compare equal.
///
/// ```
/// use stride::normalization::normalize_label;
/// assert_eq!(normalize_label("  Мост "), "Мост");
/// ```
pub fn normalize_label(label: impl AsRef<str>) -> String {
    label.as_ref().trim().nfd().collect()
}

/// Deserializes a label through [`normalize_label`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;

    Ok(normalize_label(label))
}

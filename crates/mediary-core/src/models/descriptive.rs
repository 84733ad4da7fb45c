use serde::{Deserialize, Serialize};

/// Accessibility and SEO fields attached to at most one artifact.
///
/// Every field is optional; absence of the whole record is valid and must not
/// block any read path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DescriptiveMetadata {
    pub alt_text: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
    pub focus_keyword: Option<String>,
    pub credits: Option<String>,
    pub copyright: Option<String>,
}

impl DescriptiveMetadata {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.alt_text.is_none()
            && self.title.is_none()
            && self.caption.is_none()
            && self.description.is_none()
            && self.focus_keyword.is_none()
            && self.credits.is_none()
            && self.copyright.is_none()
    }
}

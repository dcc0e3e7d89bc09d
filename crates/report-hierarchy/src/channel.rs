//! # Output Channels
//!
//! Every project renders its content to several output channels (PDF,
//! website, XBRL filing...) in one or more languages. Each combination owns
//! its own hierarchy.

use serde::{Deserialize, Serialize};

/// Kind of rendition a hierarchy belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Printable PDF report.
    Pdf,
    /// Public website.
    Website,
    /// Structured XBRL filing.
    Xbrl,
    /// Word/Office export.
    Word,
}

impl ChannelType {
    /// Get the string representation of the channel type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Pdf => "pdf",
            ChannelType::Website => "website",
            ChannelType::Xbrl => "xbrl",
            ChannelType::Word => "word",
        }
    }

    /// Parse channel type from string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use report_hierarchy::ChannelType;
    ///
    /// assert_eq!(ChannelType::parse("PDF"), Some(ChannelType::Pdf));
    /// assert_eq!(ChannelType::parse("web"), Some(ChannelType::Website));
    /// assert_eq!(ChannelType::parse("fax"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pdf" => Some(ChannelType::Pdf),
            "website" | "web" | "html" => Some(ChannelType::Website),
            "xbrl" | "ixbrl" => Some(ChannelType::Xbrl),
            "word" | "docx" => Some(ChannelType::Word),
            _ => None,
        }
    }
}

/// Output channel context of a hierarchy: rendition type, variant and language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputChannel {
    /// Rendition type.
    pub channel_type: ChannelType,

    /// Variant id, distinguishing several renditions of the same type
    /// (e.g., a full and a condensed PDF).
    pub variant_id: String,

    /// Language code (e.g., "en", "nl").
    pub language: String,
}

impl OutputChannel {
    /// Create a channel context.
    pub fn new(channel_type: ChannelType, variant_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            channel_type,
            variant_id: variant_id.into(),
            language: language.into(),
        }
    }

    /// Default PDF variant in a language.
    pub fn pdf(language: impl Into<String>) -> Self {
        Self::new(ChannelType::Pdf, "pdf", language)
    }

    /// Default website variant in a language.
    pub fn website(language: impl Into<String>) -> Self {
        Self::new(ChannelType::Website, "website", language)
    }

    /// Default XBRL variant in a language.
    pub fn xbrl(language: impl Into<String>) -> Self {
        Self::new(ChannelType::Xbrl, "xbrl", language)
    }

    /// Whether both channels render the same language.
    pub fn same_language(&self, other: &OutputChannel) -> bool {
        self.language.eq_ignore_ascii_case(&other.language)
    }
}

impl std::fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.channel_type.as_str(),
            self.variant_id,
            self.language
        )
    }
}

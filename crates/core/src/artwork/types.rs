//! Artwork record and its construction rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::text::non_blank;

// ============================================================================
// Sentinels
// ============================================================================

/// Title used when a source has none.
pub const UNTITLED: &str = "Untitled";
/// Artist used when a source has none.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Year used when a source has none.
pub const UNKNOWN_DATE: &str = "Date unknown";
/// Medium used when a source has none.
pub const UNKNOWN_MEDIUM: &str = "Unknown medium";

/// Whether `value` is one of the "unknown" placeholders.
///
/// Placeholders must not be counted when aggregating statistics over
/// a collection (favorite artists, preferred mediums, ...).
pub fn is_sentinel(value: &str) -> bool {
    matches!(
        value,
        UNTITLED | UNKNOWN_ARTIST | UNKNOWN_DATE | UNKNOWN_MEDIUM
    )
}

// ============================================================================
// Source tag
// ============================================================================

/// Which museum catalog produced a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Met,
    Artic,
    Cleveland,
    Vam,
    Rijks,
    Harvard,
    Smithsonian,
    Europeana,
    Nypl,
}

impl SourceTag {
    /// Every known source, fast tier first.
    pub const ALL: [SourceTag; 9] = [
        SourceTag::Met,
        SourceTag::Artic,
        SourceTag::Cleveland,
        SourceTag::Vam,
        SourceTag::Rijks,
        SourceTag::Harvard,
        SourceTag::Smithsonian,
        SourceTag::Europeana,
        SourceTag::Nypl,
    ];

    /// Lowercase tag, also used as the id prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Met => "met",
            SourceTag::Artic => "artic",
            SourceTag::Cleveland => "cleveland",
            SourceTag::Vam => "vam",
            SourceTag::Rijks => "rijks",
            SourceTag::Harvard => "harvard",
            SourceTag::Smithsonian => "smithsonian",
            SourceTag::Europeana => "europeana",
            SourceTag::Nypl => "nypl",
        }
    }

    /// Human-readable museum name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceTag::Met => "The Metropolitan Museum of Art",
            SourceTag::Artic => "Art Institute of Chicago",
            SourceTag::Cleveland => "Cleveland Museum of Art",
            SourceTag::Vam => "Victoria and Albert Museum",
            SourceTag::Rijks => "Rijksmuseum",
            SourceTag::Harvard => "Harvard Art Museums",
            SourceTag::Smithsonian => "Smithsonian Institution",
            SourceTag::Europeana => "Europeana",
            SourceTag::Nypl => "New York Public Library",
        }
    }

    /// Build the globally unique artwork id for a native id.
    pub fn artwork_id(&self, native_id: &str) -> String {
        format!("{}-{}", self.as_str(), native_id)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Artwork
// ============================================================================

/// A normalized artwork record.
///
/// Only produced by [`ArtworkBuilder::build`], which guarantees a non-empty
/// `image_url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    /// `{source}-{native id}`.
    pub id: String,
    pub title: String,
    pub artist: String,
    pub year: String,
    pub medium: String,
    /// Full-size image, directly fetchable.
    pub image_url: String,
    /// Smaller rendition; equals `image_url` when the source has no thumbnail.
    pub thumbnail_url: String,
    pub source: SourceTag,
    /// Deep link to the catalog entry.
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_line: Option<String>,
}

impl Artwork {
    /// The id without its source prefix.
    pub fn native_id(&self) -> &str {
        self.id
            .strip_prefix(self.source.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(&self.id)
    }

    /// Artist name, unless it is the placeholder.
    pub fn known_artist(&self) -> Option<&str> {
        known(&self.artist)
    }

    /// Medium, unless it is the placeholder.
    pub fn known_medium(&self) -> Option<&str> {
        known(&self.medium)
    }

    /// Year, unless it is the placeholder.
    pub fn known_year(&self) -> Option<&str> {
        known(&self.year)
    }
}

fn known(value: &str) -> Option<&str> {
    if is_sentinel(value) || value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Why a raw record did not become an [`Artwork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("no usable image")]
    MissingImage,
    #[error("no title")]
    MissingTitle,
    #[error("no native id")]
    MissingId,
    #[error("record does not match the expected shape")]
    Malformed,
}

impl Rejected {
    /// Short label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejected::MissingImage => "missing_image",
            Rejected::MissingTitle => "missing_title",
            Rejected::MissingId => "missing_id",
            Rejected::Malformed => "malformed",
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects fields from a raw upstream record and applies the sentinel and
/// image rules in one place.
///
/// Every setter takes an `Option<String>`; blank strings count as absent.
#[derive(Debug, Clone)]
pub struct ArtworkBuilder {
    source: SourceTag,
    native_id: String,
    title_required: bool,
    title: Option<String>,
    artist: Option<String>,
    year: Option<String>,
    medium: Option<String>,
    image_url: Option<String>,
    thumbnail_url: Option<String>,
    source_url: Option<String>,
    department: Option<String>,
    culture: Option<String>,
    classification: Option<String>,
    description: Option<String>,
    dimensions: Option<String>,
    credit_line: Option<String>,
}

impl ArtworkBuilder {
    pub fn new(source: SourceTag, native_id: impl Into<String>) -> Self {
        Self {
            source,
            native_id: native_id.into(),
            title_required: false,
            title: None,
            artist: None,
            year: None,
            medium: None,
            image_url: None,
            thumbnail_url: None,
            source_url: None,
            department: None,
            culture: None,
            classification: None,
            description: None,
            dimensions: None,
            credit_line: None,
        }
    }

    /// Reject the record instead of falling back to [`UNTITLED`].
    pub fn require_title(mut self) -> Self {
        self.title_required = true;
        self
    }

    pub fn title(mut self, value: Option<String>) -> Self {
        self.title = non_blank(value);
        self
    }

    pub fn artist(mut self, value: Option<String>) -> Self {
        self.artist = non_blank(value);
        self
    }

    pub fn year(mut self, value: Option<String>) -> Self {
        self.year = non_blank(value);
        self
    }

    pub fn medium(mut self, value: Option<String>) -> Self {
        self.medium = non_blank(value);
        self
    }

    pub fn image_url(mut self, value: Option<String>) -> Self {
        self.image_url = non_blank(value);
        self
    }

    pub fn thumbnail_url(mut self, value: Option<String>) -> Self {
        self.thumbnail_url = non_blank(value);
        self
    }

    pub fn source_url(mut self, value: Option<String>) -> Self {
        self.source_url = non_blank(value);
        self
    }

    pub fn department(mut self, value: Option<String>) -> Self {
        self.department = non_blank(value);
        self
    }

    pub fn culture(mut self, value: Option<String>) -> Self {
        self.culture = non_blank(value);
        self
    }

    pub fn classification(mut self, value: Option<String>) -> Self {
        self.classification = non_blank(value);
        self
    }

    pub fn description(mut self, value: Option<String>) -> Self {
        self.description = non_blank(value);
        self
    }

    pub fn dimensions(mut self, value: Option<String>) -> Self {
        self.dimensions = non_blank(value);
        self
    }

    pub fn credit_line(mut self, value: Option<String>) -> Self {
        self.credit_line = non_blank(value);
        self
    }

    /// Finish the record, or say why it cannot exist.
    pub fn build(self) -> Result<Artwork, Rejected> {
        let native_id = self.native_id.trim();
        if native_id.is_empty() {
            return Err(Rejected::MissingId);
        }
        let image_url = self.image_url.ok_or(Rejected::MissingImage)?;
        if self.title_required && self.title.is_none() {
            return Err(Rejected::MissingTitle);
        }

        Ok(Artwork {
            id: self.source.artwork_id(native_id),
            title: self.title.unwrap_or_else(|| UNTITLED.to_string()),
            artist: self.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            year: self.year.unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            medium: self.medium.unwrap_or_else(|| UNKNOWN_MEDIUM.to_string()),
            thumbnail_url: self.thumbnail_url.unwrap_or_else(|| image_url.clone()),
            image_url,
            source: self.source,
            source_url: self.source_url.unwrap_or_default(),
            department: self.department,
            culture: self.culture,
            classification: self.classification,
            description: self.description,
            dimensions: self.dimensions,
            credit_line: self.credit_line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_build_applies_sentinels() {
        let artwork = ArtworkBuilder::new(SourceTag::Artic, "27992")
            .image_url(s("https://example.org/full.jpg"))
            .build()
            .unwrap();

        assert_eq!(artwork.id, "artic-27992");
        assert_eq!(artwork.title, UNTITLED);
        assert_eq!(artwork.artist, UNKNOWN_ARTIST);
        assert_eq!(artwork.year, UNKNOWN_DATE);
        assert_eq!(artwork.medium, UNKNOWN_MEDIUM);
        assert_eq!(artwork.thumbnail_url, "https://example.org/full.jpg");
        assert!(artwork.known_artist().is_none());
    }

    #[test]
    fn test_build_rejects_missing_image() {
        let result = ArtworkBuilder::new(SourceTag::Met, "1")
            .title(s("Wheat Field"))
            .image_url(s("   "))
            .build();
        assert_eq!(result, Err(Rejected::MissingImage));
    }

    #[test]
    fn test_build_rejects_missing_title_when_required() {
        let result = ArtworkBuilder::new(SourceTag::Met, "1")
            .require_title()
            .image_url(s("https://example.org/a.jpg"))
            .build();
        assert_eq!(result, Err(Rejected::MissingTitle));
    }

    #[test]
    fn test_build_rejects_blank_id() {
        let result = ArtworkBuilder::new(SourceTag::Vam, " ")
            .image_url(s("https://example.org/a.jpg"))
            .build();
        assert_eq!(result, Err(Rejected::MissingId));
    }

    #[test]
    fn test_native_id() {
        let artwork = ArtworkBuilder::new(SourceTag::Rijks, "SK-C-5")
            .image_url(s("https://example.org/a.jpg"))
            .build()
            .unwrap();
        assert_eq!(artwork.id, "rijks-SK-C-5");
        assert_eq!(artwork.native_id(), "SK-C-5");
    }

    #[test]
    fn test_is_sentinel() {
        assert!(is_sentinel("Unknown Artist"));
        assert!(is_sentinel("Date unknown"));
        assert!(!is_sentinel("Rembrandt van Rijn"));
    }

    #[test]
    fn test_artwork_serialization_is_camel_case() {
        let artwork = ArtworkBuilder::new(SourceTag::Cleveland, "94979")
            .title(s("Twilight in the Wilderness"))
            .image_url(s("https://example.org/a.jpg"))
            .credit_line(s("Mr. and Mrs. William H. Marlatt Fund"))
            .build()
            .unwrap();

        let json = serde_json::to_value(&artwork).unwrap();
        assert_eq!(json["imageUrl"], "https://example.org/a.jpg");
        assert_eq!(json["thumbnailUrl"], "https://example.org/a.jpg");
        assert_eq!(json["source"], "cleveland");
        assert_eq!(json["creditLine"], "Mr. and Mrs. William H. Marlatt Fund");
        // Absent optionals are omitted
        assert!(json.get("department").is_none());
    }

    #[test]
    fn test_source_tag_roundtrip_names() {
        for tag in SourceTag::ALL {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }
}

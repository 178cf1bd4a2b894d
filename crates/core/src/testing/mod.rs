//! Testing utilities and mock sources.
//!
//! [`MockSource`] stands in for a museum API so the aggregator and the HTTP
//! layer can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use advisor_core::testing::{fixtures, MockSource};
//!
//! let met = MockSource::new(SourceTag::Met).with_artworks(fixtures::artworks(SourceTag::Met, 5));
//! let rijks = MockSource::new(SourceTag::Rijks).with_delay(Duration::from_secs(2));
//!
//! // Hand them to an Aggregator...
//! ```

mod mock_source;

pub use mock_source::{MockFailure, MockSource, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::artwork::{Artwork, ArtworkBuilder, SourceTag};

    /// Create a test artwork with reasonable defaults.
    pub fn artwork(source: SourceTag, native_id: &str) -> Artwork {
        ArtworkBuilder::new(source, native_id)
            .title(Some(format!("Artwork {}", native_id)))
            .artist(Some("Test Artist".to_string()))
            .year(Some("1889".to_string()))
            .medium(Some("Oil on canvas".to_string()))
            .image_url(Some(format!(
                "https://images.example.org/{}/{}.jpg",
                source, native_id
            )))
            .source_url(Some(format!(
                "https://collection.example.org/{}/{}",
                source, native_id
            )))
            .build()
            .expect("fixture artwork has an image")
    }

    /// Create `count` artworks with native ids `0..count`.
    pub fn artworks(source: SourceTag, count: usize) -> Vec<Artwork> {
        (0..count)
            .map(|i| artwork(source, &i.to_string()))
            .collect()
    }

    /// Create artworks with native ids `start..start + count`.
    pub fn artworks_from(source: SourceTag, start: usize, count: usize) -> Vec<Artwork> {
        (start..start + count)
            .map(|i| artwork(source, &i.to_string()))
            .collect()
    }
}

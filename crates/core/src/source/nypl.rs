//! NYPL Digital Collections adapter. Requires an API token.
//!
//! Search results carry no image, so every item costs an item-detail
//! request for its capture links (required) and a MODS request for
//! descriptive metadata (optional, falls back to defaults).

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::http::get_json;
use super::{base_url, note_rejection, page_size, pick_query, random_in, ArtSource, SourceError};
use crate::artwork::{present, Artwork, ArtworkBuilder, Rejected, SourceTag};
use crate::config::SourceConfig;

const DEFAULT_BASE_URL: &str = "https://api.repo.nypl.org/api/v2";
const SITE_URL: &str = "https://digitalcollections.nypl.org/items";
const CREDENTIAL: &str = "sources.nypl.api_token";

/// Item lookups in flight at once.
const DETAIL_CONCURRENCY: usize = 4;

const VOCABULARY: &[&str] = &[
    "painting",
    "photograph",
    "portrait",
    "landscape",
    "poster",
    "illustration",
    "print",
    "drawing",
];

/// NYPL Digital Collections API.
pub struct NyplSource {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl NyplSource {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
            api_token: config.credential().map(str::to_string),
        }
    }

    fn get(&self, url: &str, token: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", format!("Token token=\"{}\"", token))
    }

    async fn get_nypl<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T, SourceError> {
        let envelope: NyplEnvelope<T> = get_json(SourceTag::Nypl, self.get(url, token)).await?;
        Ok(envelope.nypl_api.response)
    }

    /// Resolve one search hit into an artwork. The capture is required.
    async fn item(&self, hit: NyplSearchHit, token: &str) -> Option<Artwork> {
        let uuid = present(hit.uuid.as_deref())?;

        let capture_url = format!("{}/items/{}", self.base_url, uuid);
        let captures: NyplCaptureResponse = match self.get_nypl(&capture_url, token).await {
            Ok(captures) => captures,
            Err(e) => {
                debug!(source = "nypl", uuid = %uuid, error = %e, "Capture fetch failed");
                return None;
            }
        };
        let capture = captures.capture.into_vec().into_iter().next();
        let capture_title = capture.as_ref().and_then(|c| present(c.title.as_deref()));
        let links = capture.map(NyplCapture::links).unwrap_or_default();
        if links.is_empty() {
            note_rejection(SourceTag::Nypl, Rejected::MissingImage);
            return None;
        }

        let mods_url = format!("{}/mods/{}", self.base_url, uuid);
        let mods = match self.get_nypl::<NyplModsResponse>(&mods_url, token).await {
            Ok(response) => response.mods,
            Err(e) => {
                debug!(
                    source = "nypl",
                    uuid = %uuid,
                    error = %e,
                    "MODS fetch failed, using defaults"
                );
                NyplMods::default()
            }
        };

        let title = present(hit.title.as_deref()).or(capture_title);
        match normalize(&uuid, title, &links, mods) {
            Ok(artwork) => Some(artwork),
            Err(reason) => {
                note_rejection(SourceTag::Nypl, reason);
                None
            }
        }
    }
}

#[async_trait]
impl ArtSource for NyplSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Nypl
    }

    fn requires_credential(&self) -> bool {
        true
    }

    fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }

    async fn try_fetch(&self, quota: usize) -> Result<Vec<Artwork>, SourceError> {
        let token = self
            .api_token
            .as_deref()
            .ok_or(SourceError::MissingCredential(CREDENTIAL))?;

        let term = pick_query(VOCABULARY);
        let page = random_in(1..=10);
        debug!(source = "nypl", query = term, page, quota, "Fetching items");

        let url = format!("{}/items/search", self.base_url);
        let request = self
            .get(&url, token)
            .query(&[("q", term), ("publicDomainOnly", "true")])
            .query(&[("per_page", page_size(quota)), ("page", page as usize)]);

        let envelope: NyplEnvelope<NyplSearchResponse> =
            get_json(SourceTag::Nypl, request).await?;
        let hits = envelope.nypl_api.response.result.into_vec();

        let artworks: Vec<Artwork> = stream::iter(hits)
            .map(|hit| self.item(hit, token))
            .buffer_unordered(DETAIL_CONCURRENCY)
            .filter_map(|artwork| async move { artwork })
            .take(quota)
            .collect()
            .await;
        Ok(artworks)
    }
}

// ============================================================================
// Raw API types
// ============================================================================

/// NYPL returns a bare object where a list has one element.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(values) => values,
            OneOrMany::One(value) => vec![value],
        }
    }

    fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::Many(values) => values.first(),
            OneOrMany::One(value) => Some(value),
        }
    }
}

/// `{"$": "text"}` wrapper used throughout the NYPL JSON.
#[derive(Debug, Deserialize)]
struct NyplText {
    #[serde(rename = "$")]
    value: Option<String>,
}

fn text(values: &OneOrMany<NyplText>) -> Option<String> {
    values.first().and_then(|t| present(t.value.as_deref()))
}

#[derive(Debug, Deserialize)]
struct NyplEnvelope<T> {
    #[serde(rename = "nyplAPI")]
    nypl_api: NyplBody<T>,
}

#[derive(Debug, Deserialize)]
struct NyplBody<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct NyplSearchResponse {
    #[serde(default)]
    result: OneOrMany<NyplSearchHit>,
}

#[derive(Debug, Deserialize)]
struct NyplSearchHit {
    uuid: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NyplCaptureResponse {
    #[serde(default)]
    capture: OneOrMany<NyplCapture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NyplCapture {
    title: Option<String>,
    image_links: Option<NyplImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NyplImageLinks {
    #[serde(default)]
    image_link: OneOrMany<NyplText>,
}

impl NyplCapture {
    fn links(self) -> Vec<String> {
        self.image_links
            .map(|l| l.image_link.into_vec())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| present(t.value.as_deref()))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct NyplModsResponse {
    #[serde(default)]
    mods: NyplMods,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NyplMods {
    name: OneOrMany<NyplName>,
    origin_info: OneOrMany<NyplOriginInfo>,
    physical_description: OneOrMany<NyplPhysicalDescription>,
    note: OneOrMany<NyplText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NyplName {
    #[serde(default)]
    name_part: OneOrMany<NyplText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NyplOriginInfo {
    #[serde(default)]
    date_created: OneOrMany<NyplText>,
}

#[derive(Debug, Deserialize)]
struct NyplPhysicalDescription {
    #[serde(default)]
    form: OneOrMany<NyplText>,
}

/// Pick the display image: web size, then reference size, then anything.
fn pick_image(links: &[String]) -> Option<String> {
    links
        .iter()
        .find(|l| l.contains("&t=w"))
        .or_else(|| links.iter().find(|l| l.contains("&t=r")))
        .or_else(|| links.first())
        .cloned()
}

fn normalize(
    uuid: &str,
    title: Option<String>,
    links: &[String],
    mods: NyplMods,
) -> Result<Artwork, Rejected> {
    let thumbnail = links.iter().find(|l| l.contains("&t=t")).cloned();

    let artist = mods.name.first().and_then(|n| text(&n.name_part));
    let year = mods.origin_info.first().and_then(|o| text(&o.date_created));
    let medium = mods.physical_description.first().and_then(|p| text(&p.form));

    ArtworkBuilder::new(SourceTag::Nypl, uuid)
        .title(title)
        .artist(artist)
        .year(year)
        .medium(medium)
        .image_url(pick_image(links))
        .thumbnail_url(thumbnail)
        .source_url(Some(format!("{}/{}", SITE_URL, uuid)))
        .description(text(&mods.note))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Vec<String> {
        vec![
            "https://images.nypl.org/index.php?id=123&t=t".to_string(),
            "https://images.nypl.org/index.php?id=123&t=r".to_string(),
            "https://images.nypl.org/index.php?id=123&t=w".to_string(),
        ]
    }

    #[test]
    fn test_pick_image_prefers_web_size() {
        assert_eq!(
            pick_image(&links()).as_deref(),
            Some("https://images.nypl.org/index.php?id=123&t=w")
        );
        assert_eq!(
            pick_image(&links()[..2]).as_deref(),
            Some("https://images.nypl.org/index.php?id=123&t=r")
        );
        assert_eq!(pick_image(&[]), None);
    }

    #[test]
    fn test_normalize_with_mods_objects() {
        // Single-element lists arrive as bare objects
        let json = r#"{
            "name": {"namePart": {"$": "Currier & Ives"}},
            "originInfo": {"dateCreated": [{"$": "1868"}, {"$": "1870"}]},
            "physicalDescription": {"form": {"$": "Lithographs"}},
            "note": [{"$": "Hand-colored."}, {"$": "Second note"}]
        }"#;
        let mods: NyplMods = serde_json::from_str(json).unwrap();
        let artwork = normalize(
            "510d47e3-57d0-a3d9-e040-e00a18064a99",
            Some("American homestead winter".to_string()),
            &links(),
            mods,
        )
        .unwrap();

        assert_eq!(artwork.id, "nypl-510d47e3-57d0-a3d9-e040-e00a18064a99");
        assert_eq!(artwork.artist, "Currier & Ives");
        assert_eq!(artwork.year, "1868");
        assert_eq!(artwork.medium, "Lithographs");
        assert_eq!(artwork.description.as_deref(), Some("Hand-colored."));
        assert!(artwork.thumbnail_url.ends_with("&t=t"));
        assert_eq!(
            artwork.source_url,
            "https://digitalcollections.nypl.org/items/510d47e3-57d0-a3d9-e040-e00a18064a99"
        );
    }

    #[test]
    fn test_normalize_defaults_without_mods() {
        let artwork = normalize("u1", None, &links(), NyplMods::default()).unwrap();
        assert_eq!(artwork.title, "Untitled");
        assert_eq!(artwork.artist, "Unknown Artist");
        assert!(artwork.description.is_none());
    }

    #[test]
    fn test_normalize_without_capture_is_rejected() {
        let result = normalize("u1", Some("t".to_string()), &[], NyplMods::default());
        assert_eq!(result.unwrap_err(), Rejected::MissingImage);
    }

    #[test]
    fn test_parse_capture_response() {
        let json = r#"{
            "nyplAPI": {
                "response": {
                    "capture": [{
                        "imageLinks": {"imageLink": [
                            {"$": "https://images.nypl.org/index.php?id=9&t=b"},
                            {"$": "https://images.nypl.org/index.php?id=9&t=w"}
                        ]}
                    }]
                }
            }
        }"#;
        let envelope: NyplEnvelope<NyplCaptureResponse> = serde_json::from_str(json).unwrap();
        let links = envelope
            .nypl_api
            .response
            .capture
            .into_vec()
            .into_iter()
            .next()
            .unwrap()
            .links();
        assert_eq!(links.len(), 2);
        assert!(pick_image(&links).unwrap().ends_with("&t=w"));
    }

    #[test]
    fn test_parse_search_single_result() {
        let json = r#"{"nyplAPI": {"response": {"result": {"uuid": "abc", "title": "One"}}}}"#;
        let envelope: NyplEnvelope<NyplSearchResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.nypl_api.response.result.into_vec().len(), 1);
    }
}

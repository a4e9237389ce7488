/// Overpass (OpenStreetMap) venue discovery
///
/// Queries food-tagged nodes and ways around a coordinate and extracts
/// unique display names. The adapter never fails its caller: transport or
/// parse problems resolve to an empty pool, and a successful call that
/// yields nothing is retried once after a short delay to absorb transient
/// empty results from the interpreter.
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::error::{AppError, AppResult};

const EMPTY_RETRY_DELAY: Duration = Duration::from_millis(800);
const FOOD_AMENITIES: &str = "restaurant|cafe|fast_food|food_court|street_vendor";

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
pub struct OverpassElement {
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

pub struct OverpassClient {
    http_client: HttpClient,
    api_url: String,
}

impl OverpassClient {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    /// Nearby food venue names, deduplicated, possibly empty.
    ///
    /// `retries_left` bounds the re-query on empty extraction; errors are
    /// never retried and never surfaced.
    pub async fn find_nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: u32,
        mut retries_left: u32,
    ) -> Vec<String> {
        loop {
            let names = match self.query_places(lat, lon, radius_meters).await {
                Ok(names) => names,
                Err(e) => {
                    tracing::warn!(error = %e, "place discovery failed");
                    return Vec::new();
                }
            };

            if !names.is_empty() || retries_left == 0 {
                tracing::info!(
                    count = names.len(),
                    radius_meters,
                    "place discovery completed"
                );
                return names;
            }

            tracing::debug!(retries_left, "empty place result, retrying");
            retries_left -= 1;
            tokio::time::sleep(EMPTY_RETRY_DELAY).await;
        }
    }

    async fn query_places(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: u32,
    ) -> AppResult<Vec<String>> {
        let query = build_query(lat, lon, radius_meters);

        let response = self
            .http_client
            .post(&self.api_url)
            .body(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Overpass API returned status {}",
                status
            )));
        }

        let parsed: OverpassResponse = response.json().await?;
        Ok(extract_names(parsed))
    }
}

/// Overpass QL bounding query for food venues around a point
fn build_query(lat: f64, lon: f64, radius_meters: u32) -> String {
    format!(
        r#"[out:json][timeout:25];
(
  node["amenity"~"{amenities}"](around:{radius},{lat},{lon});
  way["amenity"~"{amenities}"](around:{radius},{lat},{lon});
);
out body;
>;
out skel qt;
"#,
        amenities = FOOD_AMENITIES,
        radius = radius_meters,
        lat = lat,
        lon = lon,
    )
}

/// Unique display names in first-seen order, preferring the local `name`
/// tag over `name:en`.
fn extract_names(response: OverpassResponse) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for element in response.elements {
        let Some(tags) = element.tags else {
            continue;
        };
        let Some(name) = tags.get("name").or_else(|| tags.get("name:en")) else {
            continue;
        };
        if seen.insert(name.clone()) {
            names.push(name.clone());
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tags: &[(&str, &str)]) -> OverpassElement {
        OverpassElement {
            tags: Some(
                tags.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_build_query_embeds_radius_and_coordinates() {
        let query = build_query(13.7563, 100.5018, 2500);
        assert!(query.contains("around:2500,13.7563,100.5018"));
        assert!(query.contains("restaurant|cafe|fast_food"));
        assert!(query.contains("[out:json]"));
    }

    #[test]
    fn test_extract_names_prefers_local_name() {
        let response = OverpassResponse {
            elements: vec![element(&[("name", "ครัวคุณยาย"), ("name:en", "Grandma's Kitchen")])],
        };
        assert_eq!(extract_names(response), vec!["ครัวคุณยาย"]);
    }

    #[test]
    fn test_extract_names_falls_back_to_english() {
        let response = OverpassResponse {
            elements: vec![element(&[("name:en", "Noodle House"), ("amenity", "restaurant")])],
        };
        assert_eq!(extract_names(response), vec!["Noodle House"]);
    }

    #[test]
    fn test_extract_names_dedupes_in_first_seen_order() {
        let response = OverpassResponse {
            elements: vec![
                element(&[("name", "Shop B")]),
                element(&[("name", "Shop A")]),
                element(&[("name", "Shop B")]),
            ],
        };
        assert_eq!(extract_names(response), vec!["Shop B", "Shop A"]);
    }

    #[test]
    fn test_extract_names_skips_untagged_elements() {
        let response = OverpassResponse {
            elements: vec![
                OverpassElement { tags: None },
                element(&[("amenity", "restaurant")]),
                element(&[("name", "Only Named Place")]),
            ],
        };
        assert_eq!(extract_names(response), vec!["Only Named Place"]);
    }

    #[test]
    fn test_overpass_response_deserialization() {
        let json = r#"{
            "elements": [
                {"type": "node", "id": 1, "tags": {"name": "Cafe One", "amenity": "cafe"}},
                {"type": "node", "id": 2}
            ]
        }"#;

        let parsed: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_names(parsed), vec!["Cafe One"]);
    }
}

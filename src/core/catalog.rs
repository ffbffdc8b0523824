//! Catalog fetching and light filtering

use crate::error::{MflixError, Result};
use crate::types::{MovieRecord, SortOrder};
use std::cmp::Ordering;
use serde_json::{Value, json};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for a Firebase-style catalog (`movies_by_id.json`).
///
/// Never fails outward: with no URL configured, or when the remote is
/// unreachable or empty, the built-in sample catalog is served instead.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    http: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub async fn fetch_all_movies(&self) -> Vec<MovieRecord> {
        if self.base_url.is_empty() {
            return sample_catalog();
        }

        let url = format!("{}/movies_by_id.json", self.base_url);
        match self.fetch_json(&url).await {
            Ok(data) => {
                let movies = parse_movies(data);
                if movies.is_empty() {
                    tracing::warn!(%url, "catalog is empty, using sample catalog");
                    return sample_catalog();
                }
                tracing::info!(count = movies.len(), "catalog fetched");
                movies
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "catalog fetch failed, using sample catalog");
                sample_catalog()
            }
        }
    }

    pub async fn fetch_movie_by_id(&self, movie_id: &str) -> Option<MovieRecord> {
        if self.base_url.is_empty() {
            return sample_movie(movie_id);
        }

        let url = format!(
            "{}/movies_by_id/{}.json",
            self.base_url,
            urlencoding::encode(movie_id)
        );
        match self.fetch_json(&url).await {
            Ok(Value::Null) => sample_movie(movie_id),
            Ok(data) => parse_movie(data, Some(movie_id)).or_else(|| sample_movie(movie_id)),
            Err(e) => {
                tracing::warn!(%url, error = %e, "movie fetch failed, using sample catalog");
                sample_movie(movie_id)
            }
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MflixError::Network(format!(
                "HTTP {}: {}",
                response.status(),
                url
            )));
        }

        Ok(response.json().await?)
    }
}

/// Accept either `{id: movie, ...}` or `[movie, ...]`
pub fn parse_movies(data: Value) -> Vec<MovieRecord> {
    match data {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, item)| parse_movie(item, Some(&key)))
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| parse_movie(item, None))
            .collect(),
        _ => Vec::new(),
    }
}

/// A record without a usable `movie_id` takes `fallback_id`, or is skipped
fn parse_movie(mut item: Value, fallback_id: Option<&str>) -> Option<MovieRecord> {
    let fields = item.as_object_mut()?;

    let id = match fields.get("movie_id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback_id?.to_string(),
    };
    fields.insert("movie_id".into(), Value::String(id));

    serde_json::from_value(item).ok()
}

/// Case-insensitive match against the comma-separated genre field
pub fn filter_by_genre(movies: &[MovieRecord], genre: &str) -> Vec<MovieRecord> {
    let wanted = genre.trim().to_lowercase();
    movies
        .iter()
        .filter(|m| {
            m.genre()
                .map(|g| g.split(',').any(|part| part.trim().to_lowercase() == wanted))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Fields a search query is matched against
const SEARCH_FIELDS: [&str; 5] = ["title", "genre", "cast", "director", "industry"];

/// Case-insensitive substring match on title, genre, cast, director or
/// industry, in catalog order
pub fn search_movies(movies: &[MovieRecord], query: &str) -> Vec<MovieRecord> {
    let needle = query.trim().to_lowercase();
    movies
        .iter()
        .filter(|m| {
            SEARCH_FIELDS.iter().any(|name| {
                m.field(name)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect()
}

/// Stable sort; ties keep catalog order
pub fn sort_movies(movies: &[MovieRecord], order: SortOrder) -> Vec<MovieRecord> {
    let mut sorted = movies.to_vec();
    match order {
        SortOrder::Featured => {}
        SortOrder::Newest => sorted.sort_by(|a, b| b.number("year").total_cmp(&a.number("year"))),
        SortOrder::Oldest => sorted.sort_by(|a, b| a.number("year").total_cmp(&b.number("year"))),
        SortOrder::TopRated => {
            sorted.sort_by(|a, b| b.number("rating").total_cmp(&a.number("rating")))
        }
        SortOrder::Title => sorted.sort_by(compare_titles),
    }
    sorted
}

fn compare_titles(a: &MovieRecord, b: &MovieRecord) -> Ordering {
    let (left, right) = (a.title(), b.title());
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(&right))
}

fn sample_movie(movie_id: &str) -> Option<MovieRecord> {
    sample_catalog().into_iter().find(|m| m.movie_id == movie_id)
}

/// Served when the remote catalog is unavailable
pub fn sample_catalog() -> Vec<MovieRecord> {
    parse_movies(json!([
        {
            "movie_id": "sample-1",
            "title": "Big Buck Bunny",
            "video_url": "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
            "quality_name": "720P HD",
            "rating": "8.5",
            "year": "2024",
            "genre": "Animation",
            "short_description": "A short animated film about a big bunny.",
            "runtime": "9m"
        },
        {
            "movie_id": "sample-2",
            "title": "Elephant Dream",
            "video_url": "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
            "quality_name": "1080P FHD",
            "rating": "7.9",
            "year": "2023",
            "genre": "Action, Drama",
            "short_description": "The first Blender Open Movie from 2006.",
            "runtime": "11m"
        },
        {
            "movie_id": "sample-3",
            "title": "For Bigger Blazes",
            "video_url": "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4",
            "quality_name": "HD",
            "rating": "7.2",
            "year": "2023",
            "genre": "Action",
            "short_description": "An action-packed short film.",
            "runtime": "15m"
        },
        {
            "movie_id": "sample-4",
            "title": "Subaru Outback",
            "video_url": "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/SubaruOutbackOnStreetAndDirt.mp4",
            "quality_name": "4K",
            "rating": "6.8",
            "year": "2023",
            "genre": "Horror, Thriller",
            "short_description": "A cinematic drive through scenic landscapes.",
            "runtime": "12m"
        }
    ]))
}

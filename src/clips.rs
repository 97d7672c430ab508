//! Library of football turnover clips, played by `/turnover`.
//!
//! Clips are read once at startup from a CSV file listing each URL as `[URL]`.
//! Only Discord CDN links are kept.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use rand::seq::SliceRandom;
use regex::Regex;

/// Matches the `[URL]` entries of the clips file.
static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid regex"));

const CDN_HOST: &str = "cdn.discordapp.com";

#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    urls: Vec<String>,
}

impl ClipLibrary {
    /// Read clips from `path`. A missing or unreadable file gives an empty library.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let library = Self::parse(&content);
                tracing::info!("Loaded {} turnover clips.", library.len());
                library
            }
            Err(e) => {
                tracing::error!("Could not read turnover clips from {}. {e}", path.display());
                Self::default()
            }
        }
    }

    /// Extract clip URLs from the contents of a clips file.
    pub fn parse(content: &str) -> Self {
        let urls = ENTRY
            .captures_iter(content)
            .filter_map(|entry| entry.get(1).map(|url| url.as_str().trim()))
            .filter(|url| !url.is_empty() && url.contains(CDN_HOST))
            .map(String::from)
            .collect();
        Self { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// A random clip URL, `None` if there are none.
    pub fn random(&self) -> Option<&str> {
        self.urls.choose(&mut rand::thread_rng()).map(String::as_str)
    }

    /// Number of clips per year, ordered by year.
    /// Clips whose filename doesn't start with a year are skipped.
    pub fn clips_by_year(&self) -> Vec<(u32, usize)> {
        let mut years = BTreeMap::new();
        for url in &self.urls {
            let stem = file_stem(url);
            let year = stem.split('-').next().unwrap_or_default();
            if year.is_empty() || !year.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Ok(year) = year.parse::<u32>() {
                *years.entry(year).or_insert(0) += 1;
            }
        }
        years.into_iter().collect()
    }
}

/// Describe the game a clip is from, based on its filename.
///
/// Filenames look like `YEAR-WEEK-TEAMS.mp4`, which becomes `"YEAR WEEK: TEAMS"`.
/// Anything else is shown as is.
pub fn game_info(url: &str) -> String {
    let name = file_stem(url);
    let parts: Vec<&str> = name.split('-').collect();

    match parts.as_slice() {
        [year, week, teams @ ..] if teams.len() >= 2 => {
            format!("{year} {week}: {}", teams.join("-"))
        }
        _ => name,
    }
}

/// Last path segment of `url` without query string or `.mp4`.
fn file_stem(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let filename = path.rsplit('/').next().unwrap_or_default();
    filename.replace(".mp4", "")
}

use std::{fs, path::Path, sync::Arc};

use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// A single embeddable entry in the feed. Items are identified by their
/// position in the catalog; the index is stable for the whole session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentItem {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Ordered, immutable sequence of content items.
///
/// The embed endpoint behind each `url` must permit framing; that cannot be
/// verified at load time, so only transport hygiene is checked here.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<ContentItem>,
}

impl Catalog {
    pub fn new(items: Vec<ContentItem>) -> Result<Self> {
        if items.is_empty() {
            bail!("catalog must contain at least one item");
        }

        for (index, item) in items.iter().enumerate() {
            if !item.url.starts_with("https://") {
                warn!(
                    "catalog item {} ({}) is not served over https: {}",
                    index, item.title, item.url
                );
            }
        }

        Ok(Self { items })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let items: Vec<ContentItem> =
            serde_json::from_str(json).context("failed to parse catalog JSON")?;
        Self::new(items)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog from {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.items.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ContentItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> ContentItem {
        ContentItem {
            title: title.to_string(),
            url: format!("https://{}.example.app", title),
            description: format!("{} description", title),
        }
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(Catalog::new(Vec::new()).is_err());
    }

    #[test]
    fn get_out_of_range_returns_none() {
        let catalog = Catalog::new(vec![item("a"), item("b")]).unwrap();
        assert!(catalog.get(1).is_some());
        assert!(catalog.get(2).is_none());
        assert_eq!(catalog.last_index(), 1);
    }

    #[test]
    fn parses_json_array() {
        let json = r#"[
            {"title": "Snake", "url": "https://snake.example.app", "description": "Collect food and grow!"},
            {"title": "Flappy", "url": "https://flappy.example.app", "description": "Tap to fly!"}
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().title, "Snake");
    }

    #[test]
    fn malformed_json_reports_context() {
        let err = Catalog::from_json_str("not json").unwrap_err();
        assert!(err.to_string().contains("catalog"));
    }

    #[test]
    fn plain_http_urls_are_accepted() {
        let items = vec![ContentItem {
            title: "Legacy".into(),
            url: "http://legacy.example.app".into(),
            description: "Old embed".into(),
        }];
        assert!(Catalog::new(items).is_ok());
    }
}

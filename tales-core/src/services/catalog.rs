//! Catalog service - read-only lookup over the tales shown in the app

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::adapters::demo::demo_tales;
use crate::domain::result::Result;
use crate::domain::{Tale, TaleKind};

pub struct CatalogService {
    tales: Vec<Tale>,
}

impl CatalogService {
    pub fn new(tales: Vec<Tale>) -> Self {
        Self { tales }
    }

    /// Catalog backed by the built-in demo tales
    pub fn from_demo() -> Result<Self> {
        Ok(Self::new(demo_tales()?))
    }

    /// Load a catalog from a JSON array of tales
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let tales: Vec<Tale> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid catalog {}", path.display()))?;
        debug!(count = tales.len(), path = %path.display(), "catalog loaded");
        Ok(Self::new(tales))
    }

    pub fn all(&self) -> &[Tale] {
        &self.tales
    }

    pub fn get(&self, id: &str) -> Option<&Tale> {
        self.tales.iter().find(|t| t.id == id)
    }

    pub fn by_kind(&self, kind: TaleKind) -> Vec<&Tale> {
        self.tales.iter().filter(|t| t.kind == kind).collect()
    }

    /// Naive substring search, catalog order, no ranking. A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Tale> {
        let needle = query.trim().to_lowercase();
        self.tales.iter().filter(|t| t.matches(&needle)).collect()
    }

    pub fn featured(&self) -> Vec<&Tale> {
        self.tales.iter().filter(|t| t.featured).collect()
    }

    /// Resolve saved identifiers to tales, skipping ids not in the catalog
    pub fn saved_tales<I, S>(&self, ids: I) -> Vec<&Tale>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .filter_map(|id| self.get(id.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lookup_and_filters() {
        let catalog = CatalogService::from_demo().unwrap();
        assert_eq!(catalog.all().len(), 10);
        assert_eq!(catalog.get("dummy-hotel-2").unwrap().kind, TaleKind::Hotel);
        assert!(catalog.get("nope").is_none());

        assert_eq!(catalog.by_kind(TaleKind::Attraction).len(), 3);
        let featured: Vec<_> = catalog.featured().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(featured, vec!["dummy-video-1", "dummy-hotel-1"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = CatalogService::from_demo().unwrap();
        let hits = catalog.search("  KYOTO ");
        assert!(hits.iter().any(|t| t.id == "dummy-video-1"));
        assert!(catalog.search("zzz-no-match").is_empty());
        assert_eq!(catalog.search("").len(), 10);
    }

    #[test]
    fn test_saved_tales_skips_unknown() {
        let catalog = CatalogService::from_demo().unwrap();
        let tales = catalog.saved_tales(["dummy-event-1", "gone", "dummy-video-2"]);
        let ids: Vec<_> = tales.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["dummy-event-1", "dummy-video-2"]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id":"t1","type":"event","title":"Jazz","description":"","location":"Oslo"}]"#,
        )
        .unwrap();

        let catalog = CatalogService::from_file(&path).unwrap();
        assert_eq!(catalog.all().len(), 1);
        assert!(CatalogService::from_file(&dir.path().join("missing.json")).is_err());
    }
}

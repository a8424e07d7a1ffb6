//! Catalog entries

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

/// What kind of experience a tale describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaleKind {
    Video,
    Hotel,
    Event,
    Restaurant,
    Attraction,
}

impl TaleKind {
    pub const ALL: [TaleKind; 5] = [
        TaleKind::Video,
        TaleKind::Hotel,
        TaleKind::Event,
        TaleKind::Restaurant,
        TaleKind::Attraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaleKind::Video => "video",
            TaleKind::Hotel => "hotel",
            TaleKind::Event => "event",
            TaleKind::Restaurant => "restaurant",
            TaleKind::Attraction => "attraction",
        }
    }
}

impl fmt::Display for TaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TaleKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted || format!("{}s", k.as_str()) == wanted)
            .ok_or_else(|| Error::validation(format!("Unknown tale kind: {}", s)))
    }
}

/// A travel experience in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tale {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TaleKind,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub personality_type: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl Tale {
    /// Case-insensitive substring match over title, description, location and tags.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.location.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_accepts_plural() {
        assert_eq!("Hotels".parse::<TaleKind>().unwrap(), TaleKind::Hotel);
        assert_eq!("video".parse::<TaleKind>().unwrap(), TaleKind::Video);
        assert!("spaceship".parse::<TaleKind>().is_err());
    }

    #[test]
    fn test_tale_json_shape() {
        let json = r#"{
            "id": "dummy-video-1",
            "type": "video",
            "title": "Tea Ceremony",
            "description": "Temple visit",
            "location": "Kyoto, Japan",
            "tags": ["Cultural"],
            "priceRange": "$50"
        }"#;
        let tale: Tale = serde_json::from_str(json).unwrap();
        assert_eq!(tale.kind, TaleKind::Video);
        assert_eq!(tale.price_range.as_deref(), Some("$50"));
        assert!(!tale.featured);
        assert!(tale.matches("kyoto"));
        assert!(tale.matches("cultural"));
        assert!(!tale.matches("paris"));
    }
}

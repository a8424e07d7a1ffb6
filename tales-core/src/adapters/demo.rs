//! Built-in demo catalog
//!
//! A small fixed set of tales shipped with the binary so the catalog can be
//! browsed without any data file.

use crate::domain::result::Result;
use crate::domain::Tale;

const DEMO_CATALOG: &str = include_str!("demo_catalog.json");

/// Parse the embedded demo catalog
pub fn demo_tales() -> Result<Vec<Tale>> {
    Ok(serde_json::from_str(DEMO_CATALOG)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaleKind;

    #[test]
    fn test_demo_catalog_parses() {
        let tales = demo_tales().unwrap();
        assert_eq!(tales.len(), 10);
        for kind in TaleKind::ALL {
            assert!(tales.iter().any(|t| t.kind == kind), "missing {}", kind);
        }
    }
}

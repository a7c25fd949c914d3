//! Catalog loading from TOML
//!
//! The catalog file lists the site's routes and its recommendable topics:
//!
//! ```toml
//! routes = ["/", "/biology", "/biology/cells"]
//!
//! [topics.mitosis]
//! title = "Mitosis"
//! path = "/biology/mitosis"
//! icon = "dna"
//! difficulty = "intermediate"
//! duration = "20 min"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use tutor_domain::{Catalog, TopicRecord};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    routes: Vec<String>,
    topics: BTreeMap<String, TopicRecord>,
}

/// Reads [`Catalog`]s from TOML files.
pub struct CatalogLoader;

impl CatalogLoader {
    pub fn load(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Loaded catalog {}: {} route(s), {} topic(s)",
            path.display(),
            catalog.route_count(),
            catalog.topic_count()
        );
        Ok(catalog)
    }

    pub fn parse(content: &str) -> Result<Catalog, toml::de::Error> {
        let file: CatalogFile = toml::from_str(content)?;
        for (id, topic) in &file.topics {
            if !topic.path.starts_with('/') {
                warn!("Topic {} has a relative path: {}", id, topic.path);
            }
        }
        Ok(Catalog::new(file.routes, file.topics))
    }

    /// Load `path` if given, otherwise an empty catalog that authorises no
    /// route.
    pub fn load_or_empty(path: Option<&Path>) -> Result<Catalog, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                warn!("No catalog configured: every navigation will be rejected");
                Ok(Catalog::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
routes = ["/biology/", "/biology/cells"]

[topics.mitosis]
title = "Mitosis"
path = "/biology/mitosis"
difficulty = "intermediate"

[topics.osmosis]
title = "Osmosis"
path = "/biology/osmosis"
icon = "droplet"
"#;

    #[test]
    fn test_parse_sample() {
        let catalog = CatalogLoader::parse(SAMPLE).unwrap();
        assert!(catalog.is_valid_route("/biology"));
        assert!(catalog.is_valid_route("/biology/mitosis"));
        assert!(!catalog.is_valid_route("/"));
        assert_eq!(catalog.topic_count(), 2);

        let (_, mitosis) = catalog.resolve_topic("mitosis").unwrap();
        assert_eq!(mitosis.icon, "book");
        assert_eq!(catalog.resolve_topic("osmosis").unwrap().1.icon, "droplet");
    }

    #[test]
    fn test_parse_empty_file() {
        let catalog = CatalogLoader::parse("").unwrap();
        assert_eq!(catalog.route_count(), 0);
        assert_eq!(catalog.topic_count(), 0);
    }

    #[test]
    fn test_topic_without_title_is_invalid() {
        assert!(CatalogLoader::parse("[topics.x]\npath = \"/x\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{SAMPLE}").unwrap();
        let catalog = CatalogLoader::load(file.path()).unwrap();
        assert!(catalog.is_valid_route("/biology/cells"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = CatalogLoader::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn test_load_or_empty_without_path() {
        let catalog = CatalogLoader::load_or_empty(None).unwrap();
        assert_eq!(catalog.route_count(), 0);
        assert!(!catalog.is_valid_route("/"));
    }
}

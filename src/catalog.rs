use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{PipelineResult, StoreError};
use crate::store::RawStore;

/// One row of the upstream course catalog (`courses.csv`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogRow {
    pub code: String,
    pub title: String,
    pub professor: String,
    pub link: String,
    #[serde(default)]
    pub id: String,
    pub term: String,
    pub identifier: String,
}

/// A single unit of fetch work: where to download from and what to key it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoursePackage {
    pub url: String,
    pub identifier: String,
}

/// How the raw store lines up with the catalog.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Coverage {
    pub catalog: usize,
    pub stored: usize,
    /// Catalog identifiers with no stored page, in catalog order.
    pub pending: Vec<String>,
    /// Stored identifiers the catalog does not know, sorted.
    pub orphans: Vec<String>,
}

/// Catalog snapshot, in file order, indexed by identifier.
#[derive(Debug, Default)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_reader(file)?;
        info!("Loaded {} catalog rows from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(reader: R) -> PipelineResult<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        for row in rdr.deserialize() {
            rows.push(row?);
        }
        Ok(Self::from_rows(rows))
    }

    /// Build from rows, keeping the first occurrence of each identifier.
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        let mut catalog = Catalog::default();
        for row in rows {
            if catalog.index.contains_key(&row.identifier) {
                warn!("Duplicate catalog identifier dropped: {}", row.identifier);
                continue;
            }
            catalog.index.insert(row.identifier.clone(), catalog.rows.len());
            catalog.rows.push(row);
        }
        catalog
    }

    pub fn lookup(&self, identifier: &str) -> Option<&CatalogRow> {
        self.index.get(identifier).map(|&i| &self.rows[i])
    }

    pub fn packages(&self) -> Vec<CoursePackage> {
        self.rows
            .iter()
            .map(|r| CoursePackage {
                url: r.link.clone(),
                identifier: r.identifier.clone(),
            })
            .collect()
    }

    /// Compare against what `store` already holds.
    pub fn coverage(&self, store: &dyn RawStore) -> Result<Coverage, StoreError> {
        let listed = store.list()?;
        let stored: HashSet<&str> = listed.iter().map(String::as_str).collect();
        let pending = self
            .rows
            .iter()
            .filter(|r| !stored.contains(r.identifier.as_str()))
            .map(|r| r.identifier.clone())
            .collect();
        let orphans = listed
            .iter()
            .filter(|id| self.lookup(id).is_none())
            .cloned()
            .collect();
        Ok(Coverage {
            catalog: self.len(),
            stored: stored.len(),
            pending,
            orphans,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Tests ──

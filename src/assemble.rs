use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::dataset::CourseRecord;
use crate::error::{ParseError, PipelineError, PipelineResult};
use crate::parser::{self, layout::Layout};
use crate::store::RawStore;

/// Result of one assembly run.
#[derive(Debug, Default)]
pub struct Assembly {
    /// In raw-store enumeration order (sorted by identifier).
    pub records: Vec<CourseRecord>,
    /// Pages that did not match the layout, or vanished between list and get.
    pub skipped: Vec<String>,
}

enum Outcome {
    Parsed(CourseRecord),
    Skipped(String),
}

/// Parse every page in `store` into a record.
///
/// Fails fast on a page whose identifier has no catalog row: that means the
/// catalog and raw store disagree, and the whole run is aborted.
pub fn assemble(
    store: &dyn RawStore,
    catalog: &Catalog,
    layout: &Layout,
) -> PipelineResult<Assembly> {
    let identifiers = store.list()?;
    info!("Assembling {} raw pages (layout {})", identifiers.len(), layout.version);

    let pb = ProgressBar::new(identifiers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let outcomes = identifiers
        .par_iter()
        .map(|identifier| {
            let outcome = process_one(store, catalog, layout, identifier);
            pb.inc(1);
            outcome
        })
        .collect::<PipelineResult<Vec<Outcome>>>();
    pb.finish_and_clear();

    let mut assembly = Assembly::default();
    for outcome in outcomes? {
        match outcome {
            Outcome::Parsed(record) => assembly.records.push(record),
            Outcome::Skipped(identifier) => assembly.skipped.push(identifier),
        }
    }

    info!(
        "Assembled {} records ({} skipped)",
        assembly.records.len(),
        assembly.skipped.len()
    );
    Ok(assembly)
}

fn process_one(
    store: &dyn RawStore,
    catalog: &Catalog,
    layout: &Layout,
    identifier: &str,
) -> PipelineResult<Outcome> {
    let Some(raw) = store.get(identifier)? else {
        warn!("Raw page for {} disappeared during assembly", identifier);
        return Ok(Outcome::Skipped(identifier.to_string()));
    };

    match parser::parse_page(&raw, identifier, catalog, layout) {
        Ok(record) => Ok(Outcome::Parsed(record)),
        Err(e @ ParseError::LayoutMismatch { .. }) => {
            warn!("Skipping: {}", e);
            Ok(Outcome::Skipped(identifier.to_string()))
        }
        Err(e @ ParseError::MissingCatalogRow { .. }) => Err(PipelineError::Parse(e)),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::dataset::{self, COLUMNS};
    use crate::parser::layout::QGUIDE_2023;
    use crate::store::{DirStore, MemoryStore};

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::load(Path::new("tests/fixtures/courses.csv")).unwrap()
    }

    #[test]
    fn end_to_end_single_course() {
        let store = MemoryStore::new();
        store.put("CS50_Intro(Smith)_f2022", &fixture("cs50_intro")).unwrap();

        let out = assemble(&store, &catalog(), &QGUIDE_2023).unwrap();
        assert_eq!(out.records.len(), 1);
        assert!(out.skipped.is_empty());

        let r = &out.records[0];
        assert_eq!(r.overall_instructor_mean, None);
        assert_eq!(
            r.comments.as_deref(),
            Some(&["Great class".to_string(), "Hard but worth it".to_string()][..])
        );
        let sentiment = r.comment_sentiment.as_ref().unwrap();
        assert_eq!(sentiment.len(), 2);
        assert!(sentiment.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn records_follow_sorted_identifier_order() {
        let store = MemoryStore::new();
        store.put("MATH21B_Linear Algebra(Lee)_s2023", &fixture("sparse")).unwrap();
        store.put("EC10A_Principles/Economics(Jones)_f2022", &fixture("cs50_intro")).unwrap();
        store.put("CS50_Intro(Smith)_f2022", &fixture("cs50_intro")).unwrap();

        let out = assemble(&store, &catalog(), &QGUIDE_2023).unwrap();
        let ids: Vec<&str> = out.records.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "CS50_Intro(Smith)_f2022",
                "EC10A_Principles/Economics(Jones)_f2022",
                "MATH21B_Linear Algebra(Lee)_s2023",
            ]
        );
        for r in &out.records {
            match (&r.comments, &r.comment_sentiment) {
                (Some(c), Some(s)) => assert_eq!(c.len(), s.len()),
                (None, None) => {}
                _ => panic!("comments and sentiment out of step for {}", r.identifier),
            }
            for mean in [r.overall_course_mean, r.overall_instructor_mean].into_iter().flatten() {
                assert!((0.0..=1.0).contains(&mean));
            }
        }
    }

    #[test]
    fn page_without_catalog_row_aborts() {
        let store = MemoryStore::new();
        store.put("CS50_Intro(Smith)_f2022", &fixture("cs50_intro")).unwrap();
        store.put("GHOST_Course(Nobody)_f2022", &fixture("cs50_intro")).unwrap();

        let err = assemble(&store, &catalog(), &QGUIDE_2023).unwrap_err();
        match err {
            PipelineError::Parse(ParseError::MissingCatalogRow { identifier }) => {
                assert_eq!(identifier, "GHOST_Course(Nobody)_f2022")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn layout_mismatch_is_skipped_not_fatal() {
        let store = MemoryStore::new();
        store.put("CS50_Intro(Smith)_f2022", &fixture("cs50_intro")).unwrap();
        store
            .put("MATH21B_Linear Algebra(Lee)_s2023", "<html><body>Service unavailable</body></html>")
            .unwrap();

        let out = assemble(&store, &catalog(), &QGUIDE_2023).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped, vec!["MATH21B_Linear Algebra(Lee)_s2023"]);
    }

    #[test]
    fn disk_store_to_csv() {
        let raw = tempfile::tempdir().unwrap();
        let store = DirStore::open(raw.path()).unwrap();
        store.put("EC10A_Principles/Economics(Jones)_f2022", &fixture("cs50_intro")).unwrap();
        std::fs::write(raw.path().join("README.txt"), "not a page").unwrap();

        let out = assemble(&store, &catalog(), &QGUIDE_2023).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].professor, "Jones");

        let mut csv = Vec::new();
        dataset::write_csv(&out.records, &mut csv).unwrap();
        let mut rdr = csv::Reader::from_reader(csv.as_slice());
        let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, COLUMNS);
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "EC10A_Principles/Economics(Jones)_f2022");
        assert_eq!(&row[6], "0.84");
        assert_eq!(&row[7], "");
    }

    #[test]
    fn empty_store_yields_empty_dataset() {
        let out = assemble(&MemoryStore::new(), &catalog(), &QGUIDE_2023).unwrap();
        assert!(out.records.is_empty());
    }
}

pub mod layout;
pub mod tree;

use scraper::Html;
use tracing::warn;

use crate::catalog::Catalog;
use crate::dataset::CourseRecord;
use crate::error::ParseError;
use crate::sentiment;
use layout::{Field, Layout, ValueKind};

/// Parse one raw report page into a record, joined with its catalog row.
///
/// A missing catalog row or a page that does not match `layout` is an error;
/// a missing or sentinel statistic is just `None`.
pub fn parse_page(
    raw: &str,
    identifier: &str,
    catalog: &Catalog,
    layout: &Layout,
) -> Result<CourseRecord, ParseError> {
    let row = catalog
        .lookup(identifier)
        .ok_or_else(|| ParseError::MissingCatalogRow {
            identifier: identifier.to_string(),
        })?;

    let doc = Html::parse_document(raw);
    if tree::select(&doc, layout.anchor).is_empty() {
        return Err(ParseError::LayoutMismatch {
            identifier: identifier.to_string(),
            layout: layout.version,
            anchor: layout.anchor,
        });
    }

    let mut record = CourseRecord {
        identifier: identifier.to_string(),
        id: row.id.clone(),
        code: row.code.clone(),
        title: row.title.clone(),
        professor: row.professor.clone(),
        term: row.term.clone(),
        overall_course_mean: None,
        overall_instructor_mean: None,
        coursework_mean: None,
        coursework_median: None,
        coursework_mode: None,
        coursework_stddev: None,
        comments: None,
        comment_sentiment: None,
    };

    for query in layout.fields {
        let text = tree::select(&doc, query.path)
            .first()
            .map(tree::node_text)
            .filter(|t| !t.is_empty())
            .filter(|t| query.sentinel != Some(t.as_str()));
        let Some(text) = text else {
            continue;
        };

        match query.kind {
            ValueKind::Mean => {
                let mean = parse_mean(&text);
                if mean.is_none() {
                    warn!("{}: unusable {:?} value {:?}", identifier, query.field, text);
                }
                match query.field {
                    Field::OverallCourseMean => record.overall_course_mean = mean,
                    Field::OverallInstructorMean => record.overall_instructor_mean = mean,
                    other => warn!("{:?} is not a mean field", other),
                }
            }
            ValueKind::Text => match query.field {
                Field::CourseworkMean => record.coursework_mean = Some(text),
                Field::CourseworkMedian => record.coursework_median = Some(text),
                Field::CourseworkMode => record.coursework_mode = Some(text),
                Field::CourseworkStddev => record.coursework_stddev = Some(text),
                other => warn!("{:?} is not a text field", other),
            },
        }
    }

    let comments: Vec<String> = tree::select(&doc, layout.comments)
        .iter()
        .map(tree::node_text)
        .collect();
    record.comments = Some(comments).filter(|c| !c.is_empty());
    record.comment_sentiment = record
        .comments
        .as_ref()
        .map(|c| c.iter().map(|text| sentiment::compound(text)).collect());

    Ok(record)
}

/// Raw 5-point value → `[0,1]`, rounded to 4 decimals.
pub fn normalize_mean(raw: f64) -> Option<f64> {
    if !(0.0..=5.0).contains(&raw) {
        return None;
    }
    Some((raw / 5.0 * 10_000.0).round() / 10_000.0)
}

fn parse_mean(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().and_then(normalize_mean)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRow;
    use layout::QGUIDE_2023;

    const CS50: &str = "CS50_Intro(Smith)_f2022";

    fn catalog() -> Catalog {
        Catalog::from_rows(vec![CatalogRow {
            code: "CS50".into(),
            title: "Intro".into(),
            professor: "Smith".into(),
            link: "http://x".into(),
            id: "bluera-1001".into(),
            term: "f2022".into(),
            identifier: CS50.into(),
        }])
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn full_report_page() {
        let r = parse_page(&fixture("cs50_intro"), CS50, &catalog(), &QGUIDE_2023).unwrap();
        assert_eq!(r.identifier, CS50);
        assert_eq!(r.id, "bluera-1001");
        assert_eq!(r.code, "CS50");
        assert_eq!(r.title, "Intro");
        assert_eq!(r.professor, "Smith");
        assert_eq!(r.term, "f2022");
        assert_eq!(r.overall_course_mean, Some(0.84));
        assert_eq!(r.overall_instructor_mean, None);
        assert_eq!(r.coursework_mean.as_deref(), Some("7.52"));
        assert_eq!(r.coursework_median.as_deref(), Some("7"));
        assert_eq!(r.coursework_mode.as_deref(), Some("6"));
        assert_eq!(r.coursework_stddev, None);
        assert_eq!(
            r.comments,
            Some(vec!["Great class".to_string(), "Hard but worth it".to_string()])
        );
        let sentiment = r.comment_sentiment.unwrap();
        assert_eq!(sentiment.len(), 2);
        assert!(sentiment.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn sparse_page_maps_missing_nodes_to_none() {
        let r = parse_page(&fixture("sparse"), CS50, &catalog(), &QGUIDE_2023).unwrap();
        assert_eq!(r.overall_course_mean, Some(0.9));
        assert_eq!(r.overall_instructor_mean, Some(0.76));
        assert_eq!(r.coursework_mean, None);
        assert_eq!(r.coursework_stddev, None);
        assert_eq!(r.comments, None);
        assert_eq!(r.comment_sentiment, None);
    }

    #[test]
    fn missing_catalog_row_is_an_error() {
        let err = parse_page(&fixture("cs50_intro"), "GHOST_Course(Nobody)_f2022", &catalog(), &QGUIDE_2023)
            .unwrap_err();
        match err {
            ParseError::MissingCatalogRow { identifier } => {
                assert_eq!(identifier, "GHOST_Course(Nobody)_f2022")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn foreign_page_is_a_layout_mismatch() {
        let raw = "<html><body><h1>Access denied</h1></body></html>";
        let err = parse_page(raw, CS50, &catalog(), &QGUIDE_2023).unwrap_err();
        assert!(matches!(err, ParseError::LayoutMismatch { layout: "qguide-2023", .. }));
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = fixture("cs50_intro");
        let a = parse_page(&raw, CS50, &catalog(), &QGUIDE_2023).unwrap();
        let b = parse_page(&raw, CS50, &catalog(), &QGUIDE_2023).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mean_normalization() {
        assert_eq!(normalize_mean(4.2), Some(0.84));
        assert_eq!(normalize_mean(5.0), Some(1.0));
        assert_eq!(normalize_mean(3.33), Some(0.666));
        assert_eq!(normalize_mean(5.5), None);
        assert_eq!(parse_mean("NRP"), None);
        assert_eq!(parse_mean("4.2"), Some(0.84));
    }
}

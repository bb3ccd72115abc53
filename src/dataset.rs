use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::PipelineResult;

/// Column order of the output dataset. Downstream consumers rely on it.
pub const COLUMNS: [&str; 14] = [
    "identifier",
    "id",
    "code",
    "title",
    "professor",
    "term",
    "overall_course_mean",
    "overall_instructor_mean",
    "coursework_mean",
    "coursework_median",
    "coursework_mode",
    "coursework_stddev",
    "comments",
    "comment_sentiment",
];

/// One row of the output dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
    pub identifier: String,
    pub id: String,
    pub code: String,
    pub title: String,
    pub professor: String,
    pub term: String,
    /// `[0,1]`
    pub overall_course_mean: Option<f64>,
    /// `[0,1]`
    pub overall_instructor_mean: Option<f64>,
    pub coursework_mean: Option<String>,
    pub coursework_median: Option<String>,
    pub coursework_mode: Option<String>,
    pub coursework_stddev: Option<String>,
    pub comments: Option<Vec<String>>,
    /// Same length and order as `comments`; `None` exactly when `comments` is.
    pub comment_sentiment: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DatasetFormat {
    /// CSV with a header row; list columns hold JSON arrays
    #[default]
    Csv,
    /// One JSON object per line
    Jsonl,
}

impl CourseRecord {
    fn csv_fields(&self) -> PipelineResult<Vec<String>> {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        let comments = match &self.comments {
            Some(c) => serde_json::to_string(c)?,
            None => String::new(),
        };
        let sentiment = match &self.comment_sentiment {
            Some(s) => serde_json::to_string(s)?,
            None => String::new(),
        };
        Ok(vec![
            self.identifier.clone(),
            self.id.clone(),
            self.code.clone(),
            self.title.clone(),
            self.professor.clone(),
            self.term.clone(),
            opt(&self.overall_course_mean),
            opt(&self.overall_instructor_mean),
            opt(&self.coursework_mean),
            opt(&self.coursework_median),
            opt(&self.coursework_mode),
            opt(&self.coursework_stddev),
            comments,
            sentiment,
        ])
    }
}

pub fn write_csv<W: Write>(records: &[CourseRecord], writer: W) -> PipelineResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.write_record(record.csv_fields()?)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_jsonl<W: Write>(records: &[CourseRecord], mut writer: W) -> PipelineResult<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the whole dataset to `path`, replacing any previous file only once fully written.
pub fn save(records: &[CourseRecord], path: &Path, format: DatasetFormat) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".part");
    let tmp = Path::new(&tmp_name);

    let file = std::io::BufWriter::new(fs::File::create(tmp)?);
    match format {
        DatasetFormat::Csv => write_csv(records, file)?,
        DatasetFormat::Jsonl => write_jsonl(records, file)?,
    }
    fs::rename(tmp, path)?;
    Ok(())
}

// ── Tests ──

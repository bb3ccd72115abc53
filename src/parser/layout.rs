//! Where each statistic lives in a report page.
//!
//! Layout drift is handled by adding a new [`Layout`] table here, not by
//! touching extraction logic.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    OverallCourseMean,
    OverallInstructorMean,
    CourseworkMean,
    CourseworkMedian,
    CourseworkMode,
    CourseworkStddev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Raw 1-5 scale value, normalized to `[0,1]`.
    Mean,
    /// Kept verbatim as text.
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldQuery {
    pub field: Field,
    pub path: &'static str,
    pub kind: ValueKind,
    /// Cell text that means "no value".
    pub sentinel: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub version: &'static str,
    /// Must match on any page of this layout; absence means the page is something else.
    pub anchor: &'static str,
    pub fields: &'static [FieldQuery],
    /// Every comment cell, in document order.
    pub comments: &'static str,
}

pub const QGUIDE_2023: Layout = Layout {
    version: "qguide-2023",
    anchor: "/html/body/article",
    fields: &[
        FieldQuery {
            field: Field::OverallCourseMean,
            path: "/html/body/article/div[3]/div[1]/table/tbody/tr[1]/td[7]",
            kind: ValueKind::Mean,
            sentinel: None,
        },
        FieldQuery {
            field: Field::OverallInstructorMean,
            path: "/html/body/article/div[5]/div[1]/table/tbody/tr[1]/td[7]",
            kind: ValueKind::Mean,
            sentinel: Some("NRP"),
        },
        FieldQuery {
            field: Field::CourseworkMean,
            path: "/html/body/article/div[6]/div[2]/div/div[3]/table/tbody/tr[3]/td",
            kind: ValueKind::Text,
            sentinel: None,
        },
        FieldQuery {
            field: Field::CourseworkMedian,
            path: "/html/body/article/div[6]/div[2]/div/div[3]/table/tbody/tr[4]/td",
            kind: ValueKind::Text,
            sentinel: None,
        },
        FieldQuery {
            field: Field::CourseworkMode,
            path: "/html/body/article/div[6]/div[2]/div/div[3]/table/tbody/tr[5]/td",
            kind: ValueKind::Text,
            sentinel: None,
        },
        FieldQuery {
            field: Field::CourseworkStddev,
            path: "/html/body/article/div[6]/div[2]/div/div[3]/table/tbody/tr[6]/td",
            kind: ValueKind::Text,
            sentinel: Some("N/A"),
        },
    ],
    comments: "/html/body/article/div[9]/div[2]/div[1]/table/tbody/tr/td",
};

// ── Tests ──

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of header rows preceding data rows in exported tables.
pub const HEADER_ROWS: usize = 1;

/// Whether a run processes a fixed prefix of the input or all of it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Test,
    Full,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Full => "full",
        }
    }
}

/// Reference to an earlier data row of the same result set.
///
/// Holds the 0-based data-row index; the spreadsheet row number (1-based,
/// after the header) is only produced when rendering.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(into = "usize", try_from = "usize")]
pub struct RowReference {
    index: usize,
}

impl RowReference {
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// Row number as displayed by spreadsheet tools.
    pub fn display_row(self) -> usize {
        self.index + HEADER_ROWS + 1
    }

    pub fn from_display_row(row: usize) -> Option<Self> {
        row.checked_sub(HEADER_ROWS + 1).map(Self::new)
    }
}

impl fmt::Display for RowReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_row())
    }
}

impl From<RowReference> for usize {
    fn from(value: RowReference) -> Self {
        value.display_row()
    }
}

impl TryFrom<usize> for RowReference {
    type Error = String;

    fn try_from(row: usize) -> Result<Self, Self::Error> {
        Self::from_display_row(row)
            .ok_or_else(|| format!("row {row} does not reference a data row"))
    }
}

/// Outcome of one oracle-mediated match decision.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchResult {
    pub best_new_url: String,
    pub confidence: f64,
    pub rationale: String,
    /// Shortlist offered to the oracle, in rank order.
    pub candidates: Vec<String>,
}

impl MatchResult {
    /// Heuristic fallback: first offered candidate, zero confidence.
    pub fn fallback(candidates: Vec<String>, reason: impl fmt::Display) -> Self {
        Self {
            best_new_url: candidates.first().cloned().unwrap_or_default(),
            confidence: 0.0,
            rationale: format!("fallback: {reason}"),
            candidates,
        }
    }
}

/// One output row: the match plus display and duplicate annotations.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResultRecord {
    pub old_url: String,
    pub old_segment: String,
    pub best_new_url: String,
    pub new_segment: String,
    pub is_category_page: bool,
    pub confidence: f64,
    pub low_confidence: bool,
    pub rationale: String,
    pub candidates: Vec<String>,
    #[serde(default)]
    pub source_dup_of: Option<RowReference>,
    #[serde(default)]
    pub dest_dup_of: Option<RowReference>,
}

impl ResultRecord {
    /// Row highlight; source duplicates win over destination duplicates,
    /// which win over low confidence.
    pub fn highlight(&self) -> Option<Highlight> {
        if self.source_dup_of.is_some() {
            Some(Highlight::SourceDuplicate)
        } else if self.dest_dup_of.is_some() {
            Some(Highlight::DestinationDuplicate)
        } else if self.low_confidence {
            Some(Highlight::LowConfidence)
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    SourceDuplicate,
    DestinationDuplicate,
    LowConfidence,
}

impl Highlight {
    pub fn color(self) -> &'static str {
        match self {
            Self::SourceDuplicate => "red",
            Self::DestinationDuplicate => "yellow",
            Self::LowConfidence => "orange",
        }
    }

    /// Solid row fill (`0xRRGGBB`) used by spreadsheet exports.
    pub fn fill_rgb(self) -> u32 {
        match self {
            Self::SourceDuplicate => 0xFFC7CE,
            Self::DestinationDuplicate => 0xFFFFE0,
            Self::LowConfidence => 0xFFE5CC,
        }
    }
}

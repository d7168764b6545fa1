use serde::Serialize;
use tabled::Tabled;

/// One upstream row: the encounter count for a unique
/// (facility, site, program, month, year, voided) combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    pub facility: String,
    pub site_id: i64,
    pub program_id: i64,
    pub month: u32,
    pub year: i32,
    pub voided: bool,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageRecord {
    pub schema_name: String,
    pub size_mb: f64,
}

/// Heatmap intensity: the largest single row count seen for the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct HeatmapCell {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Facility")]
    #[tabled(rename = "Facility")]
    pub facility: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct YearTotal {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Facility")]
    #[tabled(rename = "Facility")]
    pub facility: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct FacilitySplit {
    #[serde(rename = "Facility")]
    #[tabled(rename = "Facility")]
    pub facility: String,
    #[serde(rename = "Voided")]
    #[tabled(rename = "Voided")]
    pub voided: bool,
    #[serde(rename = "Records")]
    #[tabled(rename = "Records")]
    pub records: u64,
}

/// A ranked label. `formatted` is for display only; ordering uses `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct RankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Formatted")]
    #[tabled(rename = "Formatted")]
    pub formatted: String,
}

/// Headline number shown above the facility table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HeadlineMetric {
    Available {
        label: String,
        value: u64,
        formatted: String,
    },
    /// Year falls at or before the data-quality cutoff.
    Unavailable,
}

impl HeadlineMetric {
    pub const PLACEHOLDER: &'static str = "-";

    pub fn label(&self) -> &str {
        match self {
            HeadlineMetric::Available { label, .. } => label,
            HeadlineMetric::Unavailable => Self::PLACEHOLDER,
        }
    }

    pub fn display_value(&self) -> &str {
        match self {
            HeadlineMetric::Available { formatted, .. } => formatted,
            HeadlineMetric::Unavailable => Self::PLACEHOLDER,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, HeadlineMetric::Available { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoidedSummary {
    pub year: i32,
    pub rows: Vec<FacilitySplit>,
    pub voided_total: u64,
    pub unvoided_total: u64,
    pub voided: HeadlineMetric,
    pub unvoided: HeadlineMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitCategorisation {
    pub year: i32,
    pub threshold: u64,
    pub facilities: usize,
    pub above_threshold: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitReport {
    pub selected_year: i32,
    pub available_years: Vec<i32>,
    pub heatmap: Vec<HeatmapCell>,
    pub year_totals: Vec<YearTotal>,
    pub split: VoidedSummary,
    pub ranking: Vec<RankingRow>,
    /// Upper bound of the records progress column.
    pub max_records: u64,
    pub categorisation: Option<VisitCategorisation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageReport {
    pub rows: Vec<RankingRow>,
    pub max_size_mb: f64,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_records: u64,
    pub total_rows: usize,
    pub total_facilities: usize,
    pub total_years: usize,
    pub selected_year: i32,
    pub voided_records: String,
    pub unvoided_records: String,
    pub high_volume_percent: Option<f64>,
}

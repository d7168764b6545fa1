use std::cmp::Ordering;
use std::collections::HashSet;

use crate::aggregate::{
    available_years, checked_total, filter_by_year, group_by, group_sum, Aggregation,
};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::types::{
    FacilitySplit, HeadlineMetric, HeatmapCell, RankingRow, StorageRecord, StorageReport,
    SummaryStats, VisitCategorisation, VisitRecord, VisitReport, VoidedSummary, YearTotal,
};
use crate::util::{format_magnitude, format_number};

/// Year × facility intensity matrix over every year.
///
/// Cells hold the MAX row count for the pair, not the sum. This mirrors the
/// dashboard's colour channel and differs from [`build_year_totals`] on
/// purpose.
pub fn build_heatmap(rows: &[VisitRecord]) -> Result<Vec<HeatmapCell>> {
    let cells = group_by(
        rows,
        |r| (r.year, r.facility.clone()),
        |r| r.count,
        Aggregation::Max,
    )?
    .into_entries()
    .into_iter()
    .map(|((year, facility), value)| HeatmapCell {
        year,
        facility,
        value,
    })
    .collect();
    Ok(cells)
}

/// Summed visits per (year, facility) over every year.
pub fn build_year_totals(rows: &[VisitRecord]) -> Result<Vec<YearTotal>> {
    let totals = group_sum(rows, |r| (r.year, r.facility.clone()), |r| r.count)?
        .into_entries()
        .into_iter()
        .map(|((year, facility), total)| YearTotal {
            year,
            facility,
            total,
        })
        .collect();
    Ok(totals)
}

/// Voided/unvoided breakdown for rows already filtered to `year`.
pub fn split_voided(
    year_rows: &[VisitRecord],
    year: i32,
    cfg: &ReportConfig,
) -> Result<VoidedSummary> {
    let by_pair = group_sum(year_rows, |r| (r.facility.clone(), r.voided), |r| r.count)?;
    let by_flag = group_sum(by_pair.entries(), |(k, _)| k.1, |(_, v)| *v)?;
    let voided_total = by_flag.get(&true).unwrap_or(0);
    let unvoided_total = by_flag.get(&false).unwrap_or(0);

    let (voided, unvoided) = if cfg.voided_split_available(year) {
        (
            headline("Voided Records", voided_total),
            headline("Unvoided Records", unvoided_total),
        )
    } else {
        tracing::warn!(
            year,
            cutoff = cfg.voided_cutoff_year,
            "voided split unavailable at or before cutoff year"
        );
        (HeadlineMetric::Unavailable, HeadlineMetric::Unavailable)
    };

    let rows = by_pair
        .into_entries()
        .into_iter()
        .map(|((facility, voided), records)| FacilitySplit {
            facility,
            voided,
            records,
        })
        .collect();

    Ok(VoidedSummary {
        year,
        rows,
        voided_total,
        unvoided_total,
        voided,
        unvoided,
    })
}

fn headline(label: &str, value: u64) -> HeadlineMetric {
    HeadlineMetric::Available {
        label: label.to_string(),
        value,
        formatted: format_magnitude(value),
    }
}

/// Per-facility totals, largest first. Ties keep input order.
pub fn facility_totals(year_rows: &[VisitRecord]) -> Result<Vec<(String, u64)>> {
    let mut totals = group_sum(year_rows, |r| r.facility.clone(), |r| r.count)?.into_entries();
    // `sort_by` is stable.
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(totals)
}

fn facility_ranking(totals: Vec<(String, u64)>) -> Vec<RankingRow> {
    totals
        .into_iter()
        .enumerate()
        .map(|(idx, (label, value))| RankingRow {
            rank: idx + 1,
            label,
            value: value as f64,
            formatted: format_magnitude(value),
        })
        .collect()
}

/// Facilities by total visits, largest first. Ties keep input order.
pub fn rank_facilities(year_rows: &[VisitRecord]) -> Result<Vec<RankingRow>> {
    Ok(facility_ranking(facility_totals(year_rows)?))
}

/// Largest schemas first, at most `top_n` rows.
pub fn rank_storage(rows: &[StorageRecord], top_n: usize) -> Vec<RankingRow> {
    let mut sorted: Vec<&StorageRecord> = rows.iter().collect();
    sorted.sort_by(|a, b| b.size_mb.partial_cmp(&a.size_mb).unwrap_or(Ordering::Equal));
    sorted
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, r)| RankingRow {
            rank: idx + 1,
            label: r.schema_name.clone(),
            value: r.size_mb,
            formatted: format_number(r.size_mb, 0),
        })
        .collect()
}

/// Share of facilities whose yearly total exceeds `threshold`.
pub fn categorise_visits(
    year_rows: &[VisitRecord],
    year: i32,
    threshold: u64,
) -> Result<VisitCategorisation> {
    let totals = group_sum(year_rows, |r| r.facility.clone(), |r| r.count)?;
    let facilities = totals.len();
    let above_threshold = totals.iter().filter(|(_, v)| *v > threshold).count();
    let percent = if facilities == 0 {
        0.0
    } else {
        above_threshold as f64 / facilities as f64 * 100.0
    };
    Ok(VisitCategorisation {
        year,
        threshold,
        facilities,
        above_threshold,
        percent,
    })
}

/// Year to show when the user has not picked one.
pub fn default_year(rows: &[VisitRecord]) -> Option<i32> {
    available_years(rows).first().copied()
}

/// Build every visit view for `selected_year`.
///
/// An empty `rows` is not an error: each view comes back empty and the
/// headlines read zero (or unavailable, for guarded years).
pub fn generate_visit_report(
    rows: &[VisitRecord],
    selected_year: i32,
    cfg: &ReportConfig,
) -> Result<VisitReport> {
    if rows.is_empty() {
        tracing::warn!("visit dataset is empty; all views will be blank");
    }
    let year_rows = filter_by_year(rows, selected_year);
    tracing::info!(
        selected_year,
        rows = rows.len(),
        year_rows = year_rows.len(),
        "generating visit report"
    );

    let totals = facility_totals(&year_rows)?;
    let max_records = totals.iter().map(|(_, v)| *v).max().unwrap_or(0);
    let categorisation = if cfg.voided_split_available(selected_year) {
        Some(categorise_visits(
            &year_rows,
            selected_year,
            cfg.high_volume_threshold,
        )?)
    } else {
        None
    };

    Ok(VisitReport {
        selected_year,
        available_years: available_years(rows),
        heatmap: build_heatmap(rows)?,
        year_totals: build_year_totals(rows)?,
        split: split_voided(&year_rows, selected_year, cfg)?,
        ranking: facility_ranking(totals),
        max_records,
        categorisation,
    })
}

pub fn generate_storage_report(rows: &[StorageRecord], cfg: &ReportConfig) -> StorageReport {
    let ranked = rank_storage(rows, cfg.storage_top_n);
    let max_size_mb = ranked.iter().map(|r| r.value).fold(0.0, f64::max);
    tracing::info!(
        schemas = rows.len(),
        shown = ranked.len(),
        "generating storage report"
    );
    StorageReport {
        rows: ranked,
        max_size_mb,
    }
}

pub fn generate_summary(rows: &[VisitRecord], report: &VisitReport) -> Result<SummaryStats> {
    let facilities: HashSet<&str> = rows.iter().map(|r| r.facility.as_str()).collect();
    Ok(SummaryStats {
        total_records: checked_total(rows.iter().map(|r| r.count), "visit records")?,
        total_rows: rows.len(),
        total_facilities: facilities.len(),
        total_years: report.available_years.len(),
        selected_year: report.selected_year,
        voided_records: report.split.voided.display_value().to_string(),
        unvoided_records: report.split.unvoided.display_value().to_string(),
        high_volume_percent: report.categorisation.as_ref().map(|c| c.percent),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::visit;
    use crate::error::ReportError;

    fn cfg() -> ReportConfig {
        ReportConfig::default()
    }

    #[test]
    fn heatmap_uses_max_while_totals_sum() {
        let rows = vec![visit("Alpha", 2020, false, 5), visit("Alpha", 2020, true, 12)];
        let heat = build_heatmap(&rows).unwrap();
        let totals = build_year_totals(&rows).unwrap();
        assert_eq!(heat.len(), 1);
        assert_eq!(heat[0].value, 12);
        assert_eq!(totals[0].total, 17);
    }

    #[test]
    fn heatmap_spans_all_years_and_skips_absent_pairs() {
        let rows = vec![
            visit("Alpha", 2019, false, 3),
            visit("Beta", 2020, false, 9),
            visit("Alpha", 2020, false, 4),
        ];
        let heat = build_heatmap(&rows).unwrap();
        let pairs: Vec<(i32, &str)> = heat.iter().map(|c| (c.year, c.facility.as_str())).collect();
        assert_eq!(pairs, vec![(2019, "Alpha"), (2020, "Beta"), (2020, "Alpha")]);
    }

    #[test]
    fn split_before_cutoff_is_unavailable() {
        let rows = vec![visit("Alpha", 2005, true, 5_000_000), visit("Alpha", 2005, false, 9)];
        let split = split_voided(&rows, 2005, &cfg()).unwrap();
        assert_eq!(split.voided, HeadlineMetric::Unavailable);
        assert_eq!(split.unvoided, HeadlineMetric::Unavailable);
        assert_eq!(split.voided.display_value(), "-");
        assert_eq!(split.voided.label(), "-");
        // the per-facility table is still computed
        assert_eq!(split.rows.len(), 2);
    }

    #[test]
    fn split_at_cutoff_year_is_unavailable() {
        let rows = vec![visit("Alpha", 2010, true, 10)];
        let split = split_voided(&rows, 2010, &cfg()).unwrap();
        assert!(!split.voided.is_available());
    }

    #[test]
    fn split_after_cutoff_formats_small_totals_as_zero_k() {
        let rows = vec![visit("Alpha", 2011, true, 10), visit("Alpha", 2011, false, 20)];
        let split = split_voided(&rows, 2011, &cfg()).unwrap();
        assert_eq!(split.voided_total, 10);
        assert_eq!(split.unvoided_total, 20);
        assert_eq!(split.voided.display_value(), "0 K");
        assert_eq!(split.unvoided.display_value(), "0 K");
        assert_eq!(split.voided.label(), "Voided Records");
    }

    #[test]
    fn split_groups_by_facility_and_flag() {
        let rows = vec![
            visit("Alpha", 2021, false, 1_000_000),
            visit("Beta", 2021, true, 2_000),
            visit("Alpha", 2021, false, 500_000),
            visit("Alpha", 2021, true, 300),
        ];
        let split = split_voided(&rows, 2021, &cfg()).unwrap();
        assert_eq!(
            split.rows,
            vec![
                FacilitySplit { facility: "Alpha".into(), voided: false, records: 1_500_000 },
                FacilitySplit { facility: "Beta".into(), voided: true, records: 2_000 },
                FacilitySplit { facility: "Alpha".into(), voided: true, records: 300 },
            ]
        );
        assert_eq!(split.unvoided.display_value(), "1.5 M");
        assert_eq!(split.voided.display_value(), "2 K");
    }

    #[test]
    fn ranking_is_descending_and_stable_on_ties() {
        let rows = vec![
            visit("Gamma", 2021, false, 10),
            visit("Alpha", 2021, false, 40),
            visit("Beta", 2021, false, 10),
            visit("Delta", 2021, true, 40),
        ];
        let ranked = rank_facilities(&rows).unwrap();
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Alpha", "Delta", "Gamma", "Beta"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[3].rank, 4);
    }

    #[test]
    fn storage_ranking_is_bounded_to_top_n() {
        let rows: Vec<StorageRecord> = (0..50)
            .map(|i| StorageRecord {
                schema_name: format!("schema_{i}"),
                size_mb: i as f64,
            })
            .collect();
        let ranked = rank_storage(&rows, cfg().storage_top_n);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].label, "schema_49");
        assert_eq!(ranked[9].label, "schema_40");
    }

    #[test]
    fn storage_ranking_keeps_tie_order_and_formats() {
        let rows = vec![
            StorageRecord { schema_name: "b".into(), size_mb: 7.0 },
            StorageRecord { schema_name: "a".into(), size_mb: 1536.0 },
            StorageRecord { schema_name: "c".into(), size_mb: 7.0 },
        ];
        let ranked = rank_storage(&rows, 10);
        let labels: Vec<&str> = ranked.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_eq!(ranked[0].formatted, "1,536");
    }

    #[test]
    fn categorisation_counts_high_volume_facilities() {
        let rows = vec![
            visit("Alpha", 2021, false, 40_000),
            visit("Alpha", 2021, true, 20_000),
            visit("Beta", 2021, false, 50_000),
            visit("Gamma", 2021, false, 1),
            visit("Delta", 2021, false, 90_000),
        ];
        let c = categorise_visits(&rows, 2021, 50_000).unwrap();
        assert_eq!(c.facilities, 4);
        assert_eq!(c.above_threshold, 2);
        assert!((c.percent - 50.0).abs() < 1e-9);
        assert_eq!(categorise_visits(&[], 2021, 50_000).unwrap().percent, 0.0);
    }

    #[test]
    fn empty_dataset_degrades_to_empty_views() {
        let report = generate_visit_report(&[], 2021, &cfg()).unwrap();
        assert!(report.heatmap.is_empty());
        assert!(report.year_totals.is_empty());
        assert!(report.ranking.is_empty());
        assert!(report.split.rows.is_empty());
        assert_eq!(report.max_records, 0);
        assert_eq!(report.split.voided.display_value(), "0 K");
        assert_eq!(report.split.unvoided.display_value(), "0 K");
        assert_eq!(default_year(&[]), None);

        let storage = generate_storage_report(&[], &cfg());
        assert!(storage.rows.is_empty());
        assert_eq!(storage.max_size_mb, 0.0);
    }

    #[test]
    fn visit_report_selects_year_for_split_only() {
        let rows = vec![
            visit("Alpha", 2020, false, 7),
            visit("Beta", 2021, false, 3_000),
            visit("Alpha", 2021, true, 2_000),
        ];
        let year = default_year(&rows).unwrap();
        assert_eq!(year, 2021);
        let report = generate_visit_report(&rows, year, &cfg()).unwrap();
        assert_eq!(report.available_years, vec![2021, 2020]);
        assert_eq!(report.heatmap.len(), 3);
        assert_eq!(report.year_totals.len(), 3);
        assert_eq!(report.ranking.len(), 2);
        assert_eq!(report.max_records, 3_000);
        assert_eq!(report.split.voided.display_value(), "2 K");
        assert_eq!(report.split.unvoided.display_value(), "3 K");
        assert!(report.categorisation.is_some());

        let summary = generate_summary(&rows, &report).unwrap();
        assert_eq!(summary.total_records, 5_007);
        assert_eq!(summary.total_facilities, 2);
        assert_eq!(summary.voided_records, "2 K");
    }

    #[test]
    fn guarded_year_has_no_categorisation() {
        let rows = vec![visit("Alpha", 2009, false, 70_000)];
        let report = generate_visit_report(&rows, 2009, &cfg()).unwrap();
        assert!(report.categorisation.is_none());
        assert_eq!(generate_summary(&rows, &report).unwrap().voided_records, "-");
    }

    #[test]
    fn max_records_is_exact_above_float_precision() {
        let big = (1u64 << 53) + 1;
        let rows = vec![visit("Alpha", 2021, false, big), visit("Beta", 2021, false, 5)];
        let report = generate_visit_report(&rows, 2021, &cfg()).unwrap();
        assert_eq!(report.max_records, big);
        assert_eq!(facility_totals(&rows).unwrap()[0], ("Alpha".to_string(), big));
    }

    #[test]
    fn overflowing_totals_fail_the_report() {
        let big = 10_000_000_000_000_000_000u64;
        let rows = vec![
            visit("Alpha", 2021, false, big),
            visit("Alpha", 2021, true, big),
        ];
        assert!(matches!(
            generate_visit_report(&rows, 2021, &cfg()),
            Err(ReportError::CountOverflow(_))
        ));
        assert!(matches!(
            build_year_totals(&rows),
            Err(ReportError::CountOverflow(_))
        ));
        // the max rule has nothing to overflow
        assert_eq!(build_heatmap(&rows).unwrap()[0].value, big);
    }

    #[test]
    fn summary_total_overflow_is_an_error() {
        let big = 10_000_000_000_000_000_000u64;
        let rows = vec![visit("Alpha", 2021, false, big), visit("Beta", 2020, false, big)];
        let report = generate_visit_report(&rows, 2021, &cfg()).unwrap();
        assert!(matches!(
            generate_summary(&rows, &report),
            Err(ReportError::CountOverflow(_))
        ));
    }
}

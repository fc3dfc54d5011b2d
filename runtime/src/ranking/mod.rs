//! Deduplication, ordering and dense re-ranking.
//!
//! All sorts are stable, so entries that compare equal keep the order in
//! which they were discovered.

use crate::model::{Period, RankedEntry, SalesEntry, SalesRecord, SortPolicy};
use std::collections::HashSet;

/// Drop repeated labels (first wins), order by `policy`, number from 1.
pub fn rank_entries(entries: Vec<SalesEntry>, policy: SortPolicy) -> Vec<RankedEntry> {
    let mut seen = HashSet::new();
    let mut unique: Vec<SalesEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.label.clone()))
        .collect();

    match policy {
        SortPolicy::ValueDesc => unique.sort_by(|a, b| b.value.cmp(&a.value)),
        SortPolicy::SourceRankAsc => unique.sort_by_key(|e| e.source_rank.unwrap_or(u32::MAX)),
    }

    unique
        .into_iter()
        .zip(1u32..)
        .map(|(e, rank)| RankedEntry {
            rank,
            label: e.label,
            value: e.value,
            source_rank: e.source_rank,
        })
        .collect()
}

/// Order the aggregate by period, then by `policy` within a period.
pub fn sort_records(records: &mut [SalesRecord], policy: SortPolicy) {
    records.sort_by(|a, b| {
        a.period.cmp(&b.period).then_with(|| match policy {
            SortPolicy::ValueDesc => b.value.cmp(&a.value),
            SortPolicy::SourceRankAsc => a.rank.cmp(&b.rank),
        })
    });
}

/// Renumber sorted records from 1, restarting whenever the period changes.
pub fn rerank_by_period(records: Vec<SalesRecord>) -> Vec<SalesRecord> {
    let capacity = records.len();
    let (_, out) = records.into_iter().fold(
        (None::<(Period, u32)>, Vec::with_capacity(capacity)),
        |(last, mut out), mut record| {
            let rank = match last {
                Some((period, n)) if period == record.period => n + 1,
                _ => 1,
            };
            record.rank = rank;
            let state = Some((record.period.clone(), rank));
            out.push(record);
            (state, out)
        },
    );
    out
}

/// Drop records whose label already appeared in the same period, first wins.
pub fn dedup_by_period(records: Vec<SalesRecord>) -> Vec<SalesRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.period.clone(), r.label.clone())))
        .collect()
}

/// Per-period dedup, global sort, then per-period re-ranking.
pub fn finalize(records: Vec<SalesRecord>, policy: SortPolicy) -> Vec<SalesRecord> {
    let mut records = dedup_by_period(records);
    sort_records(&mut records, policy);
    rerank_by_period(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn p(s: &str) -> Period {
        Period::parse(s).unwrap()
    }

    fn rec(period: &str, rank: u32, label: &str, value: u64) -> SalesRecord {
        SalesRecord {
            period: p(period),
            rank,
            label: label.to_string(),
            value,
        }
    }

    #[test]
    fn test_dedup_then_rank_by_value() {
        let ranked = rank_entries(
            vec![
                SalesEntry::new("A", 5000),
                SalesEntry::new("B", 8000),
                SalesEntry::new("A", 5000),
            ],
            SortPolicy::ValueDesc,
        );
        let got: Vec<(u32, &str, u64)> = ranked.iter().map(|e| (e.rank, e.label.as_str(), e.value)).collect();
        assert_eq!(got, [(1, "B", 8000), (2, "A", 5000)]);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let ranked = rank_entries(
            vec![
                SalesEntry::new("X", 3000),
                SalesEntry::new("Y", 9000),
                SalesEntry::new("Z", 3000),
            ],
            SortPolicy::ValueDesc,
        );
        let labels: Vec<&str> = ranked.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Y", "X", "Z"]);
    }

    #[test]
    fn test_source_rank_order() {
        let mut a = SalesEntry::new("A", 100);
        a.source_rank = Some(2);
        let mut b = SalesEntry::new("B", 50);
        b.source_rank = Some(1);
        let c = SalesEntry::new("C", 999_999);
        let ranked = rank_entries(vec![c, a, b], SortPolicy::SourceRankAsc);
        let labels: Vec<&str> = ranked.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["B", "A", "C"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        for policy in [SortPolicy::ValueDesc, SortPolicy::SourceRankAsc] {
            let once = rank_entries(
                vec![
                    SalesEntry::new("A", 5000),
                    SalesEntry::new("B", 8000),
                    SalesEntry::new("C", 8000),
                ],
                policy,
            );
            let twice = rank_entries(once.iter().cloned().map(SalesEntry::from).collect(), policy);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_rerank_restarts_per_period() {
        let records = finalize(
            vec![
                rec("2025-05", 1, "A", 100),
                rec("2025-04", 1, "B", 300),
                rec("2025-05", 2, "C", 900),
                rec("2025-04", 2, "D", 200),
                rec("2025-04", 3, "E", 400),
            ],
            SortPolicy::ValueDesc,
        );
        let got: Vec<(&str, u32, &str)> = records
            .iter()
            .map(|r| (r.period.as_str(), r.rank, r.label.as_str()))
            .collect();
        assert_eq!(
            got,
            [
                ("2025-04", 1, "E"),
                ("2025-04", 2, "B"),
                ("2025-04", 3, "D"),
                ("2025-05", 1, "C"),
                ("2025-05", 2, "A"),
            ]
        );
    }

    #[test]
    fn test_ranks_dense_per_period() {
        let mut input = Vec::new();
        for (i, period) in ["2025-06", "2025-04", "2025-05"].iter().enumerate() {
            for j in 0..(i + 2) {
                input.push(rec(period, 99, &format!("{period}-{j}"), (j as u64 + 1) * 1000));
            }
        }
        let out = finalize(input, SortPolicy::ValueDesc);
        let mut ranks: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for r in &out {
            ranks.entry(r.period.to_string()).or_default().push(r.rank);
        }
        for (_, mut rs) in ranks {
            rs.sort_unstable();
            let n = rs.len() as u32;
            assert_eq!(rs, (1..=n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_same_period_twice_keeps_one_label() {
        // The same month scraped twice must not list a brand twice.
        let out = finalize(
            vec![
                rec("2025-04", 1, "比亚迪", 380_512),
                rec("2025-04", 2, "吉利汽车", 203_114),
                rec("2025-04", 1, "比亚迪", 380_512),
                rec("2025-05", 1, "比亚迪", 372_856),
            ],
            SortPolicy::ValueDesc,
        );
        let got: Vec<(&str, u32, &str)> = out
            .iter()
            .map(|r| (r.period.as_str(), r.rank, r.label.as_str()))
            .collect();
        assert_eq!(
            got,
            [("2025-04", 1, "比亚迪"), ("2025-04", 2, "吉利汽车"), ("2025-05", 1, "比亚迪")]
        );
    }

    #[test]
    fn test_global_sort_is_stable() {
        let records = vec![
            rec("2025-04", 1, "first", 5000),
            rec("2025-04", 2, "second", 5000),
        ];
        let out = finalize(records, SortPolicy::ValueDesc);
        assert_eq!(out[0].label, "first");
        assert_eq!(out[1].label, "second");
    }

    #[test]
    fn test_source_rank_policy_uses_month_rank() {
        let out = finalize(
            vec![
                rec("2025-04", 2, "small", 10),
                rec("2025-04", 1, "top", 5),
            ],
            SortPolicy::SourceRankAsc,
        );
        assert_eq!(out[0].label, "top");
        assert_eq!(out[1].label, "small");
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::params::CoverageBonusParams;
use crate::types::ItemRecord;

/// Observed items in one (row, column) cell of the practice space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageCell {
    pub count: usize,
    #[serde(rename = "avgPL")]
    pub avg_pl: f64,
}

/// row cluster -> column cluster -> cell
pub type CoverageMatrix = BTreeMap<String, BTreeMap<String, CoverageCell>>;

fn first_with_prefix<'a>(clusters: &'a [String], prefix: &str) -> Option<&'a str> {
    clusters
        .iter()
        .find(|c| c.starts_with(prefix))
        .map(String::as_str)
}

/// The (row, column) cell an item falls into, if it has both tags.
pub fn cell_of<'a>(clusters: &'a [String], p: &CoverageBonusParams) -> Option<(&'a str, &'a str)> {
    Some((
        first_with_prefix(clusters, &p.row_prefix)?,
        first_with_prefix(clusters, &p.column_prefix)?,
    ))
}

pub fn coverage_matrix<'a>(
    items: impl IntoIterator<Item = &'a ItemRecord>,
    p: &CoverageBonusParams,
) -> CoverageMatrix {
    let mut sums: BTreeMap<(String, String), (usize, f64)> = BTreeMap::new();
    for rec in items {
        if let Some((row, col)) = cell_of(&rec.clusters, p) {
            let slot = sums.entry((row.to_string(), col.to_string())).or_default();
            slot.0 += 1;
            slot.1 += rec.p_l;
        }
    }
    let mut matrix = CoverageMatrix::new();
    for ((row, col), (count, total)) in sums {
        matrix.entry(row).or_default().insert(
            col,
            CoverageCell {
                count,
                avg_pl: total / count as f64,
            },
        );
    }
    matrix
}

/// Bonus for candidates in sparse or weak cells; 0 outside the grid.
pub fn coverage_bonus(clusters: &[String], matrix: &CoverageMatrix, p: &CoverageBonusParams) -> f64 {
    let Some((row, col)) = cell_of(clusters, p) else {
        return 0.0;
    };
    let cell = matrix
        .get(row)
        .and_then(|cols| cols.get(col))
        .copied()
        .unwrap_or_default();
    if cell.count < p.min_cell_items {
        p.sparse
    } else if cell.avg_pl < p.low_pl_threshold {
        p.low_pl
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ScoringParams;

    fn rec(key: &str, clusters: &[&str], p_l: f64) -> ItemRecord {
        let mut r = ItemRecord::new(key, clusters.iter().map(|s| s.to_string()).collect());
        r.p_l = p_l;
        r
    }

    #[test]
    fn test_matrix_groups_by_row_and_column() {
        let p = ScoringParams::default().coverage_bonus;
        let items = vec![
            rec("a", &["str_0", "zone_lo"], 0.2),
            rec("b", &["str_0", "zone_lo"], 0.4),
            rec("c", &["str_1", "zone_hi"], 1.0),
            rec("d", &["note_C"], 1.0),
        ];
        let m = coverage_matrix(&items, &p);
        let cell = m["str_0"]["zone_lo"];
        assert_eq!(cell.count, 2);
        assert!((cell.avg_pl - 0.3).abs() < 1e-12);
        assert_eq!(m["str_1"]["zone_hi"].count, 1);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_bonus_sparse_then_low_pl() {
        let p = ScoringParams::default().coverage_bonus;
        let tags: Vec<String> = vec!["str_0".into(), "zone_lo".into()];
        let mut items = vec![rec("a", &["str_0", "zone_lo"], 0.1)];
        assert_eq!(coverage_bonus(&tags, &coverage_matrix(&items, &p), &p), 0.2);

        items.push(rec("b", &["str_0", "zone_lo"], 0.1));
        items.push(rec("c", &["str_0", "zone_lo"], 0.2));
        assert_eq!(coverage_bonus(&tags, &coverage_matrix(&items, &p), &p), 0.15);

        items.iter_mut().for_each(|r| r.p_l = 0.9);
        assert_eq!(coverage_bonus(&tags, &coverage_matrix(&items, &p), &p), 0.0);
        assert_eq!(coverage_bonus(&["note_C".to_string()], &CoverageMatrix::new(), &p), 0.0);
    }
}

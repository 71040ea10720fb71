//! Fixed-width per-repository statistics table.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::aggregate::MetricSet;

const RULE_WIDTH: usize = 70;

/// Render a per-repository table followed by a TOTAL row.
///
/// The total is recomputed from the rows being displayed, so it always
/// equals the column sums shown above it.
pub fn render_stats_table(per_repo: &BTreeMap<String, MetricSet>) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<35} {:>8} {:>6} {:>7} {:>7}",
        "Repo", "Commits", "PRs", "Merges", "Issues"
    );
    let _ = writeln!(out, "{rule}");

    for (repo, m) in per_repo {
        write_stats_row(&mut out, repo, m);
    }

    let totals: MetricSet = per_repo.values().copied().sum();
    let _ = writeln!(out, "{rule}");
    write_stats_row(&mut out, "TOTAL", &totals);
    out
}

fn write_stats_row(out: &mut String, label: &str, m: &MetricSet) {
    let _ = writeln!(
        out,
        "{:<35} {:>8} {:>6} {:>7} {:>7}",
        label, m.commits, m.prs, m.merges, m.issues
    );
}

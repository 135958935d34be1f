//! Format exploration results for human consumption.

use crate::domain::Exploration;
use crate::stats::RunStatistics;

/// Format one exploration run.
pub fn format_report(exploration: &Exploration) -> String {
    let mut output = String::new();
    let domain = &exploration.domain;
    let stats = &exploration.stats;

    output.push_str("═══════════════════════════════════════════════════════════════════════\n");
    output.push_str(&format!("  Operational Domain Report ({})\n", exploration.strategy));
    output.push_str("═══════════════════════════════════════════════════════════════════════\n\n");

    output.push_str("─── Parameter Space ───────────────────────────────────────────────────\n");
    for dimension in domain.space().dimensions() {
        output.push_str(&format!(
            "{:<24}{} .. {} step {} ({} levels)\n",
            format!("{}:", dimension.parameter),
            dimension.min,
            dimension.max,
            dimension.step,
            dimension.levels()
        ));
    }
    output.push_str(&format!(
        "Grid points:            {}\n",
        domain.space().total_points()
    ));
    output.push('\n');

    output.push_str("─── Statistics ────────────────────────────────────────────────────────\n");
    output.push_str(&format_statistics(stats));
    output.push_str(&format!("Result:                 {}\n", domain.completeness()));
    output.push('\n');

    if !domain.contours().is_empty() {
        output.push_str("─── Contours ──────────────────────────────────────────────────────────\n");
        for (i, contour) in domain.contours().iter().enumerate() {
            let anchor = contour
                .points
                .first()
                .map(|p| p.to_string())
                .unwrap_or_default();
            output.push_str(&format!(
                "{}. {} points from {}, {}{}\n",
                i + 1,
                contour.points.len(),
                anchor,
                if contour.closed { "closed" } else { "open" },
                if contour.touches_grid_edge {
                    ", follows grid edge"
                } else {
                    ""
                }
            ));
        }
        if let Some(area) = domain.area_estimate() {
            output.push_str(&format!("Estimated area:         {:.1} grid points\n", area));
        }
        output.push('\n');
    }

    output.push_str("═══════════════════════════════════════════════════════════════════════\n");
    output
}

/// Format the counters of a run, one per line.
pub fn format_statistics(stats: &RunStatistics) -> String {
    let mut output = String::new();
    output.push_str(&format!("Evaluated points:       {}\n", stats.evaluated_count));
    output.push_str(&format!("Operational points:     {}\n", stats.operational_count));
    match stats.operational_fraction() {
        Ok(fraction) => output.push_str(&format!(
            "Operational fraction:   {:.2}%\n",
            fraction * 100.0
        )),
        Err(_) => output.push_str("Operational fraction:   n/a\n"),
    }
    output.push_str(&format!("Simulator calls:        {}\n", stats.oracle_invocations));
    output.push_str(&format!(
        "Cache hits:             {} ({:.1}%)\n",
        stats.cache_hits,
        stats.cache_hit_rate() * 100.0
    ));
    if stats.touches_grid_edge {
        output.push_str("Grid edge:              reached (region may extend past the sweep)\n");
    }
    output.push_str(&format!(
        "Runtime:                {:.3} s\n",
        stats.elapsed.as_secs_f64()
    ));
    output
}

/// Side-by-side comparison of two runs over the same space.
pub fn format_comparison(a: &Exploration, b: &Exploration) -> String {
    let mut output = String::new();
    output.push_str("─── Strategy Comparison ───────────────────────────────────────────────\n");
    output.push_str(&format!(
        "{:<24}{:>18}{:>18}\n",
        "",
        a.strategy.to_string(),
        b.strategy.to_string()
    ));

    let fraction = |e: &Exploration| match e.stats.operational_fraction() {
        Ok(f) => format!("{:.4}", f),
        Err(_) => "n/a".to_string(),
    };
    let rows = [
        (
            "Evaluated points",
            a.stats.evaluated_count.to_string(),
            b.stats.evaluated_count.to_string(),
        ),
        ("Operational fraction", fraction(a), fraction(b)),
        (
            "Simulator calls",
            a.stats.oracle_invocations.to_string(),
            b.stats.oracle_invocations.to_string(),
        ),
        (
            "Runtime (s)",
            format!("{:.3}", a.stats.elapsed.as_secs_f64()),
            format!("{:.3}", b.stats.elapsed.as_secs_f64()),
        ),
        (
            "Result",
            a.domain.completeness().to_string(),
            b.domain.completeness().to_string(),
        ),
    ];
    for (label, left, right) in rows {
        output.push_str(&format!("{:<24}{:>18}{:>18}\n", label, left, right));
    }

    if a.stats.evaluated_count > 0 && b.stats.evaluated_count > 0 {
        let ratio = a.stats.evaluated_count as f64 / b.stats.evaluated_count as f64;
        output.push_str(&format!(
            "{} evaluates {:.1}% of the points {} does.\n",
            a.strategy,
            ratio * 100.0,
            b.strategy
        ));
    }
    output
}

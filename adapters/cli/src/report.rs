//! Plain-text rendering of a finished scene.

use std::fmt::{self, Write};

use galton_board_rendering::Scene;

const BAR_WIDTH: u64 = 40;

/// Formats the histogram and summary statistics of `scene`.
pub(crate) fn render(scene: &Scene) -> String {
    let mut out = String::new();
    // Writing into a `String` never fails.
    let _ = write_report(&mut out, scene);
    out
}

fn write_report(out: &mut String, scene: &Scene) -> fmt::Result {
    let rows = scene.bins.len().saturating_sub(1);
    writeln!(
        out,
        "Galton board: {} balls, {rows} rows, run {} ({})",
        scene.ball_count,
        scene.state,
        scene.status_label()
    )?;
    writeln!(out, "{:>4} {:>7} {:>9} {:>9}", "bin", "count", "observed", "expected")?;

    let max_count = scene.bars.iter().map(|bar| bar.count).max().unwrap_or(0);
    for bar in &scene.bars {
        let length = if max_count == 0 {
            0
        } else {
            (bar.count * BAR_WIDTH + max_count / 2) / max_count
        };
        writeln!(
            out,
            "{:>4} {:>7} {:>8.2}% {:>8.2}% {}",
            bar.bin,
            bar.count,
            bar.observed * 100.0,
            bar.expected * 100.0,
            "#".repeat(usize::try_from(length).unwrap_or(0))
        )?;
    }

    writeln!(
        out,
        "observed: mean {:.3}, std dev {:.3} over {} balls",
        scene.observed.mean, scene.observed.std_dev, scene.observed.count
    )?;
    writeln!(
        out,
        "expected: mean {:.3}, std dev {:.3}",
        scene.theoretical.mean, scene.theoretical.std_dev
    )
}

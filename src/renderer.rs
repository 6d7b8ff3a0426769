//! # Level Trace Visualization
//!
//! Renders an FSRU level trace as an ASCII chart for terminal output. The whole run
//! is squeezed into a fixed number of columns; each column shows the lowest level
//! recorded in its tick bucket so short shortfalls stay visible.
//!
//! ```text
//! 174k   │•••            ••
//!        │   ••         •  •
//!  23k   │-----••-----•-----••--    (optimal level)
//!   3k   │_______XXXX_________      (minimum operable)
//! ```

use crate::config::Config;
use crate::{LevelTrace, Resource};

const ROWS: usize = 20;
const COLUMNS: usize = 72;
const Y_AXIS_WIDTH: usize = 7; // Space for Y-axis labels

/// Reference levels drawn on the chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartLimits {
    pub capacity: f64,
    pub optimal_level: Option<f64>,
    /// Levels at or below this are drawn as shortfalls
    pub min_operable: Option<f64>,
}

impl ChartLimits {
    pub fn for_resource(config: &Config, resource: Resource) -> Self {
        match resource {
            Resource::Fsru => Self {
                capacity: config.fsru.capacity,
                optimal_level: Some(config.optimal_level()),
                min_operable: Some(config.fsru.min_operable),
            },
            // Carrier cargo only gets a scale
            Resource::Lngc => Self {
                capacity: config.lngc.capacity,
                optimal_level: None,
                min_operable: None,
            },
        }
    }
}

/// Format a volume label, e.g. `174k`.
fn format_volume(volume: f64) -> String {
    if volume.abs() >= 1000.0 {
        format!("{:.0}k", volume / 1000.0)
    } else {
        format!("{:.0}", volume)
    }
}

/// Lowest level per column.
fn bucket_minimums(trace: &LevelTrace, columns: usize) -> Vec<Option<f64>> {
    let mut buckets = vec![None; columns];
    let ticks = trace.samples.iter().map(|s| s.tick);
    let (Some(start), Some(end)) = (ticks.clone().min(), ticks.max()) else {
        return buckets;
    };
    let span = end - start + 1;

    for sample in &trace.samples {
        let column = ((sample.tick - start) as usize * columns) / span as usize;
        let column = column.min(columns - 1);
        buckets[column] = Some(buckets[column].map_or(sample.level, |level: f64| level.min(sample.level)));
    }
    buckets
}

/// Render the trace as a multi-line string.
pub fn render_ascii(trace: &LevelTrace, limits: ChartLimits) -> String {
    let columns = COLUMNS.min(trace.samples.len().max(1));
    let buckets = bucket_minimums(trace, columns);

    let level_to_row = |level: f64| {
        let normalized = (level / limits.capacity).clamp(0.0, 1.0);
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut grid = vec![vec![' '; columns + Y_AXIS_WIDTH]; ROWS];

    // Reference lines first so the trace draws over them
    for (level, ch) in [(limits.optimal_level, '-'), (limits.min_operable, '_')] {
        let Some(level) = level else { continue };
        let row = level_to_row(level);
        for cell in grid[row].iter_mut().skip(Y_AXIS_WIDTH) {
            *cell = ch;
        }
    }

    // Y-axis labels at the reference levels
    let labels = [Some(limits.capacity), limits.optimal_level, limits.min_operable, Some(0.0)];
    for level in labels.into_iter().flatten() {
        let row = level_to_row(level);
        let label = format!("{:>width$}", format_volume(level), width = Y_AXIS_WIDTH - 2);
        for (i, ch) in label.chars().enumerate().take(Y_AXIS_WIDTH - 2) {
            grid[row][i] = ch;
        }
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│'; // Vertical axis line
    }

    for (column, level) in buckets.iter().enumerate() {
        let Some(level) = *level else { continue };
        let row = level_to_row(level);
        // Shortfalls are marked with a prominent X
        let shortfall = limits.min_operable.is_some_and(|min| level <= min);
        grid[row][column + Y_AXIS_WIDTH] = if shortfall { 'X' } else { '•' };
    }

    let mut out = String::new();
    out.push_str(&format!("{} level\n", trace.resource));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    // Time markers below the chart
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let markers: String = (0..columns)
        .map(|i| if i % 12 == 0 { '|' } else { ' ' })
        .collect();
    out.push_str(&format!("{}{}\n", padding, markers));

    let (first, last) = match (trace.samples.first(), trace.samples.last()) {
        (Some(f), Some(l)) => (f.tick, l.tick),
        _ => (0, 0),
    };
    let left = format!("t={}", first);
    let right = format!("t={}", last);
    let gap = columns.saturating_sub(left.len() + right.len());
    out.push_str(&format!("{}{}{}{}\n", padding, left, " ".repeat(gap), right));
    out
}

/// Print the chart to stdout.
pub fn draw_ascii(trace: &LevelTrace, limits: ChartLimits) {
    print!("{}", render_ascii(trace, limits));
}

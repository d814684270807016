#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Waypoint geometry that maps peg and bin indices onto board coordinates.
//!
//! Layout is a pure function of the row count and the [`BoardArea`]. Rows are
//! spaced evenly between the top margin and a clearance band reserved for the
//! bins; each row is centred horizontally and shares the spacing of the final
//! row so bins line up underneath it. Every waypoint is finally passed through
//! [`contain`], which keeps it away from the area edges.

use galton_board_core::BoardArea;
use glam::Vec2;
use tracing::debug;

/// Vertical offset of the first peg row below the top margin.
const PEG_TOP_OFFSET: f32 = 40.0;
/// Height reserved beneath the peg field for the bins.
const BIN_CLEARANCE: f32 = 80.0;
/// Distance from the bottom edge to the bin row.
const BIN_BOTTOM_OFFSET: f32 = 60.0;
/// Vertical inset applied by [`contain`] and used for the entry point.
const VERTICAL_INSET: f32 = 20.0;
/// Points closer than this to an edge are treated as degenerate.
const EDGE_GUARD: f32 = 10.0;

/// Resolved peg, bin and entry coordinates for one board layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoints {
    row_count: u32,
    area: BoardArea,
    pegs: Vec<Vec2>,
    bins: Vec<Vec2>,
    entry: Vec2,
}

impl Waypoints {
    /// Computes every waypoint for `row_count` rows laid out inside `area`.
    #[must_use]
    pub fn compute(row_count: u32, area: BoardArea) -> Self {
        let margin = area.margin();
        let usable_width = area.width() - 2.0 * margin;
        let usable_height = area.height() - 2.0 * margin - BIN_CLEARANCE;
        let divisions = row_count as f32 + 1.0;
        let spacing = Vec2::new(usable_width / divisions, usable_height / divisions);

        let min_x = area.left() + margin;
        let max_x = area.right() - margin;
        let min_y = area.top() + margin;
        let max_y = area.bottom() - margin - BIN_CLEARANCE;

        let peg_count = triangular(row_count);
        let mut pegs = Vec::with_capacity(peg_count);
        for row in 0..row_count {
            let row_start = min_x + (usable_width - row as f32 * spacing.x) * 0.5;
            let y = min_y + row as f32 * spacing.y + PEG_TOP_OFFSET;
            for column in 0..=row {
                let x = row_start + column as f32 * spacing.x;
                let raw = Vec2::new(
                    clamp_between(x, min_x, max_x),
                    clamp_between(y, min_y, max_y),
                );
                pegs.push(contain(&area, raw));
            }
        }

        let bin_start = min_x + (usable_width - row_count as f32 * spacing.x) * 0.5;
        let bin_y = area.bottom() - BIN_BOTTOM_OFFSET;
        let bins = (0..=row_count)
            .map(|bin| {
                let x = clamp_between(bin_start + bin as f32 * spacing.x, min_x, max_x);
                contain(&area, Vec2::new(x, bin_y))
            })
            .collect();

        let entry_x = pegs.first().map_or(area.center().x, |peg| peg.x);
        let entry = contain(&area, Vec2::new(entry_x, area.top() + VERTICAL_INSET));

        Self {
            row_count,
            area,
            pegs,
            bins,
            entry,
        }
    }

    /// Row count the layout was computed for.
    #[must_use]
    pub const fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Board area the layout was computed for.
    #[must_use]
    pub const fn area(&self) -> &BoardArea {
        &self.area
    }

    /// Position of the peg at `row` and `column`, if it exists.
    #[must_use]
    pub fn peg(&self, row: u32, column: u32) -> Option<Vec2> {
        if row >= self.row_count || column > row {
            return None;
        }
        self.pegs.get(triangular(row) + column as usize).copied()
    }

    /// Position of `bin`, if it exists.
    #[must_use]
    pub fn bin(&self, bin: u32) -> Option<Vec2> {
        usize::try_from(bin)
            .ok()
            .and_then(|index| self.bins.get(index))
            .copied()
    }

    /// Spawn point above the first peg.
    #[must_use]
    pub const fn entry(&self) -> Vec2 {
        self.entry
    }

    /// Iterator over `(row, column, position)` for every peg in row-major order.
    pub fn pegs(&self) -> impl Iterator<Item = (u32, u32, Vec2)> + '_ {
        (0..self.row_count)
            .flat_map(|row| (0..=row).map(move |column| (row, column)))
            .zip(self.pegs.iter().copied())
            .map(|((row, column), position)| (row, column, position))
    }

    /// Bin positions in bin order.
    #[must_use]
    pub fn bins(&self) -> &[Vec2] {
        &self.bins
    }
}

/// Keeps `point` strictly inside `area`.
///
/// The point is clamped to the margin-inset rectangle; a result that still
/// lies within a few units of an edge (only possible for tiny areas) is
/// replaced by the area centre.
#[must_use]
pub fn contain(area: &BoardArea, point: Vec2) -> Vec2 {
    let margin = area.margin();
    let x = clamp_between(point.x, area.left() + margin, area.right() - margin);
    let y = clamp_between(
        point.y,
        area.top() + VERTICAL_INSET,
        area.bottom() - VERTICAL_INSET,
    );

    let near_edge = x <= area.left() + EDGE_GUARD
        || x >= area.right() - EDGE_GUARD
        || y <= area.top() + EDGE_GUARD
        || y >= area.bottom() - EDGE_GUARD;
    if near_edge {
        area.center()
    } else {
        Vec2::new(x, y)
    }
}

/// Memoizes the most recent layout keyed by row count and board area.
#[derive(Debug)]
pub struct WaypointCache {
    current: Waypoints,
    revision: u64,
}

impl WaypointCache {
    /// Creates a cache primed with the layout for the provided key.
    #[must_use]
    pub fn new(row_count: u32, area: BoardArea) -> Self {
        Self {
            current: Waypoints::compute(row_count, area),
            revision: 1,
        }
    }

    /// Returns the layout for the provided key, recomputing it when the key changed.
    pub fn resolve(&mut self, row_count: u32, area: BoardArea) -> &Waypoints {
        if self.current.row_count != row_count || self.current.area != area {
            self.current = Waypoints::compute(row_count, area);
            self.revision = self.revision.wrapping_add(1);
            debug!(row_count, revision = self.revision, "recomputed waypoints");
        }
        &self.current
    }

    /// Layout computed by the last [`resolve`](Self::resolve) call.
    #[must_use]
    pub const fn current(&self) -> &Waypoints {
        &self.current
    }

    /// Number of times a layout has been computed.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

fn triangular(rows: u32) -> usize {
    let rows = rows as usize;
    rows * (rows + 1) / 2
}

fn clamp_between(value: f32, low: f32, high: f32) -> f32 {
    value.min(high).max(low)
}

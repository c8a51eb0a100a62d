use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CityConfiguration;

/// A lot on the city grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub column: u32,
    pub row: u32,
}

impl CellCoord {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

/// Placement of the lot grid in world space (XZ plane, Y up).
///
/// The grid is centred on the origin. Streets run between lots and around
/// the outer edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub block_size: f32,
    pub street_width: f32,
}

impl GridLayout {
    pub fn from_config(config: &CityConfiguration) -> Self {
        Self {
            columns: config.columns,
            rows: config.rows,
            block_size: config.block_size,
            street_width: config.street_width,
        }
    }

    /// Distance between neighbouring lot centres.
    pub fn pitch(&self) -> f32 {
        self.block_size + self.street_width
    }

    /// World-space XZ size of the whole grid including the outer streets.
    pub fn extent(&self) -> Vec2 {
        Vec2::new(
            self.columns as f32 * self.pitch() + self.street_width,
            self.rows as f32 * self.pitch() + self.street_width,
        )
    }

    /// Minimum XZ corner of the grid (outer street edge).
    pub fn origin(&self) -> Vec2 {
        -self.extent() * 0.5
    }

    /// Ground-level centre of a lot.
    pub fn cell_center(&self, coord: CellCoord) -> Vec3 {
        let o = self.origin();
        let half_street = self.street_width * 0.5;
        Vec3::new(
            o.x + half_street + (coord.column as f32 + 0.5) * self.pitch(),
            0.0,
            o.y + half_street + (coord.row as f32 + 0.5) * self.pitch(),
        )
    }

    /// Distance of a lot from the grid centre, 0 at the centre and 1 at the
    /// outermost corner lot.
    pub fn centrality(&self, coord: CellCoord) -> f32 {
        let half = Vec2::new(
            (self.columns as f32 - 1.0) * 0.5,
            (self.rows as f32 - 1.0) * 0.5,
        );
        let max = half.length();
        if max <= f32::EPSILON {
            return 0.0;
        }
        let d = Vec2::new(coord.column as f32, coord.row as f32) - half;
        (d.length() / max).clamp(0.0, 1.0)
    }

    /// Every lot in row-major order. The order is part of the determinism
    /// contract: instance `i` always comes from the same lot.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + use<> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord { column, row }))
    }

    /// Street centre lines as XZ segments at ground level, for the floor grid.
    pub fn street_lines(&self) -> Vec<[Vec3; 2]> {
        let o = self.origin();
        let e = self.extent();
        let half_street = self.street_width * 0.5;
        let mut lines = Vec::with_capacity((self.columns + self.rows + 2) as usize);
        for i in 0..=self.columns {
            let x = o.x + half_street + i as f32 * self.pitch();
            lines.push([Vec3::new(x, 0.0, o.y), Vec3::new(x, 0.0, o.y + e.y)]);
        }
        for i in 0..=self.rows {
            let z = o.y + half_street + i as f32 * self.pitch();
            lines.push([Vec3::new(o.x, 0.0, z), Vec3::new(o.x + e.x, 0.0, z)]);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(columns: u32, rows: u32) -> GridLayout {
        GridLayout {
            columns,
            rows,
            block_size: 10.0,
            street_width: 2.0,
        }
    }

    #[test]
    fn grid_is_centred_on_origin() {
        let l = layout(4, 4);
        let first = l.cell_center(CellCoord::new(0, 0));
        let last = l.cell_center(CellCoord::new(3, 3));
        assert!((first + last).length() < 1e-4);
    }

    #[test]
    fn neighbouring_lots_are_one_pitch_apart() {
        let l = layout(3, 2);
        let a = l.cell_center(CellCoord::new(0, 0));
        let b = l.cell_center(CellCoord::new(1, 0));
        let c = l.cell_center(CellCoord::new(0, 1));
        assert!(((b - a).x - 12.0).abs() < 1e-4);
        assert!(((c - a).z - 12.0).abs() < 1e-4);
    }

    #[test]
    fn cells_are_row_major_and_complete() {
        let l = layout(3, 2);
        let cells: Vec<_> = l.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], CellCoord::new(0, 0));
        assert_eq!(cells[1], CellCoord::new(1, 0));
        assert_eq!(cells[3], CellCoord::new(0, 1));
    }

    #[test]
    fn centrality_spans_zero_to_one() {
        let l = layout(5, 5);
        assert_eq!(l.centrality(CellCoord::new(2, 2)), 0.0);
        assert!((l.centrality(CellCoord::new(0, 0)) - 1.0).abs() < 1e-5);
        assert_eq!(layout(1, 1).centrality(CellCoord::new(0, 0)), 0.0);
    }

    #[test]
    fn street_lines_frame_every_lot() {
        let l = layout(4, 3);
        assert_eq!(l.street_lines().len(), 5 + 4);
    }
}

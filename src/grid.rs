use smallvec::SmallVec;
use std::fmt;

use crate::cells::{Cartesian2DCoordinate, CompassPrimary};
use crate::units::{ColumnLength, EdgesCount, NodesCount, RowLength};

pub type CoordinateSmallVec = SmallVec<[Cartesian2DCoordinate; 4]>;

/// A rectangular 4-neighbour lattice of cells where every edge still present is a wall.
///
/// A fresh grid has a wall between every pair of axis-adjacent cells. Carving removes
/// the wall, opening a passage. Each cell keeps a bit mask of the directions in which a
/// wall stands, and both cells sharing an edge always agree about it.
#[derive(Clone)]
pub struct Grid {
    wall_masks: Vec<u8>,
    row_length: RowLength,
    column_length: ColumnLength,
    walls_count: usize,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Grid :: walls: {:?}, rows: {:?}, columns: {:?}",
               self.walls_count, self.row_length, self.column_length)
    }
}

impl Grid {
    /// Build the fully walled lattice. A zero dimension gives an empty grid with no cells.
    pub fn new(row_length: RowLength, column_length: ColumnLength) -> Grid {

        let (NodesCount(nodes), EdgesCount(edges)) = graph_size(row_length, column_length);

        let mut grid = Grid {
            wall_masks: vec![0; nodes],
            row_length,
            column_length,
            walls_count: edges,
        };

        for index in 0..nodes {
            let coord = Cartesian2DCoordinate::from_row_major_index(index, row_length);
            let mask = CompassPrimary::ALL
                .iter()
                .filter(|&&dir| grid.neighbour_at_direction(coord, dir).is_some())
                .fold(0, |mask, dir| mask | dir.mask_bit());
            grid.wall_masks[index] = mask;
        }

        grid
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.wall_masks.len()
    }

    #[inline]
    pub fn row_length(&self) -> RowLength {
        self.row_length
    }

    #[inline]
    pub fn column_length(&self) -> ColumnLength {
        self.column_length
    }

    /// Nodes and edges of the complete lattice with these dimensions.
    #[inline]
    pub fn graph_size(&self) -> (NodesCount, EdgesCount) {
        graph_size(self.row_length, self.column_length)
    }

    /// Number of walls still standing.
    #[inline]
    pub fn walls_count(&self) -> usize {
        self.walls_count
    }

    /// Is the grid coordinate valid for this grid - within the grid's dimensions
    #[inline]
    pub fn is_valid_coordinate(&self, coord: Cartesian2DCoordinate) -> bool {
        (coord.x as usize) < self.row_length.0 && (coord.y as usize) < self.column_length.0
    }

    /// Convert a grid coordinate to a one dimensional index in the range 0...grid.size().
    /// Returns None if the grid coordinate is invalid.
    #[inline]
    pub fn grid_coordinate_to_index(&self, coord: Cartesian2DCoordinate) -> Option<usize> {
        if self.is_valid_coordinate(coord) {
            Some(coord.y as usize * self.row_length.0 + coord.x as usize)
        } else {
            None
        }
    }

    pub fn neighbour_at_direction(&self,
                                  coord: Cartesian2DCoordinate,
                                  direction: CompassPrimary)
                                  -> Option<Cartesian2DCoordinate> {
        coord.offset(direction)
             .filter(|&neighbour_coord| self.is_valid_coordinate(neighbour_coord))
    }

    /// Cells to the North, South, East or West of a cell in the complete lattice, whether or
    /// not a wall still separates them.
    pub fn neighbours(&self, coord: Cartesian2DCoordinate) -> CoordinateSmallVec {
        if !self.is_valid_coordinate(coord) {
            return CoordinateSmallVec::new();
        }
        CompassPrimary::ALL
            .iter()
            .filter_map(|&dir| self.neighbour_at_direction(coord, dir))
            .collect()
    }

    /// Does a wall stand between two cells? False for cells that are not adjacent.
    pub fn has_wall(&self, a: Cartesian2DCoordinate, b: Cartesian2DCoordinate) -> bool {
        self.adjacent_direction(a, b)
            .map_or(false, |dir| self.has_wall_at_direction(a, dir))
    }

    pub fn has_wall_at_direction(&self, coord: Cartesian2DCoordinate, dir: CompassPrimary) -> bool {
        self.grid_coordinate_to_index(coord)
            .map_or(false, |index| self.wall_masks[index] & dir.mask_bit() != 0)
    }

    /// Remove the wall between two adjacent cells, opening a passage.
    /// Returns true if a wall was removed.
    pub fn carve(&mut self, a: Cartesian2DCoordinate, b: Cartesian2DCoordinate) -> bool {
        if !self.has_wall(a, b) {
            return false;
        }

        if let (Some(dir), Some(a_index), Some(b_index)) = (self.adjacent_direction(a, b),
                                                            self.grid_coordinate_to_index(a),
                                                            self.grid_coordinate_to_index(b)) {
            self.wall_masks[a_index] &= !dir.mask_bit();
            self.wall_masks[b_index] &= !dir.opposite().mask_bit();
            self.walls_count -= 1;
            true
        } else {
            false
        }
    }

    /// Iterate all cells in row major order.
    pub fn iter(&self) -> CellIter {
        CellIter {
            row_length: self.row_length,
            current_cell_number: 0,
            cells_count: self.size(),
        }
    }

    /// Iterate every standing wall once, as the pair of cells it separates.
    pub fn iter_walls(&self) -> WallsIter {
        WallsIter {
            grid: self,
            cell_index: 0,
            south_pending: false,
        }
    }

    fn adjacent_direction(&self,
                          a: Cartesian2DCoordinate,
                          b: Cartesian2DCoordinate)
                          -> Option<CompassPrimary> {
        CompassPrimary::ALL
            .iter()
            .cloned()
            .find(|&dir| self.neighbour_at_direction(a, dir) == Some(b))
    }
}

/// Nodes count and edges count of a complete `w * h` 4-neighbour lattice.
pub fn graph_size(row_length: RowLength, column_length: ColumnLength) -> (NodesCount, EdgesCount) {
    let (w, h) = (row_length.0, column_length.0);
    let horizontal_edges = w.saturating_sub(1) * h;
    let vertical_edges = h.saturating_sub(1) * w;
    (NodesCount(w * h), EdgesCount(horizontal_edges + vertical_edges))
}

/// Draws the maze with `#` walls, cells at even display positions and a closed border.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display_width = (self.row_length.0 * 2).saturating_sub(1);
        let display_height = (self.column_length.0 * 2).saturating_sub(1);
        let border = "#".repeat(display_width + 2);

        writeln!(f, "{}", border)?;
        for display_y in 0..display_height {
            let mut line = String::with_capacity(display_width + 2);
            line.push('#');
            for display_x in 0..display_width {
                let walled = match (display_x % 2, display_y % 2) {
                    (0, 0) => false,
                    (1, 1) => true,
                    (1, _) => {
                        let west = Cartesian2DCoordinate::new((display_x / 2) as u32,
                                                              (display_y / 2) as u32);
                        self.has_wall_at_direction(west, CompassPrimary::East)
                    }
                    _ => {
                        let north = Cartesian2DCoordinate::new((display_x / 2) as u32,
                                                               (display_y / 2) as u32);
                        self.has_wall_at_direction(north, CompassPrimary::South)
                    }
                };
                line.push(if walled { '#' } else { ' ' });
            }
            line.push('#');
            writeln!(f, "{}", line)?;
        }
        write!(f, "{}", border)
    }
}

#[derive(Debug, Clone)]
pub struct CellIter {
    row_length: RowLength,
    current_cell_number: usize,
    cells_count: usize,
}

impl ExactSizeIterator for CellIter {} // default impl using size_hint()
impl Iterator for CellIter {
    type Item = Cartesian2DCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_cell_number < self.cells_count {
            let coord = Cartesian2DCoordinate::from_row_major_index(self.current_cell_number,
                                                                    self.row_length);
            self.current_cell_number += 1;
            Some(coord)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cells_count - self.current_cell_number;
        (remaining, Some(remaining))
    }
}

/// Each cell reports its east wall then its south wall, so every wall is visited once.
pub struct WallsIter<'a> {
    grid: &'a Grid,
    cell_index: usize,
    south_pending: bool,
}

impl<'a> Iterator for WallsIter<'a> {
    type Item = (Cartesian2DCoordinate, Cartesian2DCoordinate);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cell_index < self.grid.size() {
            let coord = Cartesian2DCoordinate::from_row_major_index(self.cell_index,
                                                                    self.grid.row_length);
            let dir = if self.south_pending {
                self.south_pending = false;
                self.cell_index += 1;
                CompassPrimary::South
            } else {
                self.south_pending = true;
                CompassPrimary::East
            };

            if self.grid.has_wall_at_direction(coord, dir) {
                if let Some(neighbour) = self.grid.neighbour_at_direction(coord, dir) {
                    return Some((coord, neighbour));
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.grid.walls_count))
    }
}

impl<'a> fmt::Debug for WallsIter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "WallsIter :: cell_index: {:?}, south_pending: {:?}",
               self.cell_index, self.south_pending)
    }
}

use std::convert::From;
use std::fmt;

use crate::units::RowLength;

/// A cell position in logical grid space, one unit per cell.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct Cartesian2DCoordinate {
    pub x: u32,
    pub y: u32,
}

/// A position on the display grid, where cells sit at even coordinates and the
/// wall (or passage) between two adjacent cells sits on the coordinate straddling them.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct DisplayCoordinate {
    pub x: u32,
    pub y: u32,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CompassPrimary {
    North,
    South,
    East,
    West,
}

impl CompassPrimary {
    pub const ALL: [CompassPrimary; 4] = [CompassPrimary::North,
                                          CompassPrimary::South,
                                          CompassPrimary::East,
                                          CompassPrimary::West];

    /// Bit flag used for this direction in a cell's wall mask.
    #[inline]
    pub fn mask_bit(self) -> u8 {
        match self {
            CompassPrimary::North => 0b0001,
            CompassPrimary::South => 0b0010,
            CompassPrimary::East => 0b0100,
            CompassPrimary::West => 0b1000,
        }
    }

    #[inline]
    pub fn opposite(self) -> CompassPrimary {
        match self {
            CompassPrimary::North => CompassPrimary::South,
            CompassPrimary::South => CompassPrimary::North,
            CompassPrimary::East => CompassPrimary::West,
            CompassPrimary::West => CompassPrimary::East,
        }
    }
}

impl Cartesian2DCoordinate {
    pub fn new(x: u32, y: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate { x, y }
    }

    #[inline]
    pub fn from_row_major_index(index: usize, row_length: RowLength) -> Cartesian2DCoordinate {
        let RowLength(width) = row_length;
        let x = index % width;
        let y = index / width;

        Cartesian2DCoordinate::new(x as u32, y as u32)
    }

    /// Creates a new coordinate offset 1 cell away in the given direction.
    /// Returns None if the coordinate is not representable. North is towards y = 0.
    /// The result is not checked against any grid's dimensions.
    pub fn offset(self, dir: CompassPrimary) -> Option<Cartesian2DCoordinate> {
        let (x, y) = (self.x, self.y);
        match dir {
            CompassPrimary::North => y.checked_sub(1).map(|y| Cartesian2DCoordinate { x, y }),
            CompassPrimary::South => y.checked_add(1).map(|y| Cartesian2DCoordinate { x, y }),
            CompassPrimary::East => x.checked_add(1).map(|x| Cartesian2DCoordinate { x, y }),
            CompassPrimary::West => x.checked_sub(1).map(|x| Cartesian2DCoordinate { x, y }),
        }
    }

    /// The display coordinate of this cell: `(2x, 2y)`.
    #[inline]
    pub fn to_display(self) -> DisplayCoordinate {
        DisplayCoordinate::new(self.x * 2, self.y * 2)
    }
}

impl From<(u32, u32)> for Cartesian2DCoordinate {
    fn from(x_y_pair: (u32, u32)) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate::new(x_y_pair.0, x_y_pair.1)
    }
}

impl DisplayCoordinate {
    pub fn new(x: u32, y: u32) -> DisplayCoordinate {
        DisplayCoordinate { x, y }
    }

    /// Is this the display position of a logical cell (both coordinates even)?
    #[inline]
    pub fn is_cell(self) -> bool {
        self.x % 2 == 0 && self.y % 2 == 0
    }

    /// Is this a fixed wall position that never separates two cells (both coordinates odd)?
    #[inline]
    pub fn is_fixed_wall(self) -> bool {
        self.x % 2 == 1 && self.y % 2 == 1
    }
}

impl From<(u32, u32)> for DisplayCoordinate {
    fn from(x_y_pair: (u32, u32)) -> DisplayCoordinate {
        DisplayCoordinate::new(x_y_pair.0, x_y_pair.1)
    }
}

impl From<DisplayCoordinate> for (u32, u32) {
    fn from(coord: DisplayCoordinate) -> (u32, u32) {
        (coord.x, coord.y)
    }
}

impl fmt::Display for DisplayCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The display coordinate between two cells: `(2 * min(x) + |dx|, 2 * min(y) + |dy|)`.
///
/// For axis-adjacent cells this is the wall position separating them.
pub fn wall_midpoint(a: Cartesian2DCoordinate, b: Cartesian2DCoordinate) -> DisplayCoordinate {
    let mid = |p: u32, q: u32| 2 * p.min(q) + p.max(q) - p.min(q);
    DisplayCoordinate::new(mid(a.x, b.x), mid(a.y, b.y))
}

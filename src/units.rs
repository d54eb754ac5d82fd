//! Newtype wrappers so that logical grid sizes, display sizes and pixel sizes cannot be mixed up.

/// Number of logical cells along one row (the logical grid width).
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct RowLength(pub usize);
/// Number of logical cells along one column (the logical grid height).
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct ColumnLength(pub usize);

/// Width of the display grid: logical cells plus the wall positions between them.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct DisplayWidth(pub usize);
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct DisplayHeight(pub usize);

/// Pixel sizes of a rendered image.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Width(pub usize);
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Height(pub usize);

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct NodesCount(pub usize);
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct EdgesCount(pub usize);

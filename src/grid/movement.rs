// Directional move over the focus grid
//
// Left/Right cycle within the current row and never leave it. Up/Down step
// between rows of a section and fall through to the nearest non-empty section
// when the current one runs out, keeping the column index (clamped).
// The result is always a valid index; an empty grid yields 0.

use super::{GridShape, Section};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.to_string() == name)
    }

    /// -1 for Left/Up, +1 for Right/Down
    pub fn step(self) -> isize {
        match self {
            Self::Left | Self::Up => -1,
            Self::Right | Self::Down => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Up => "Up",
            Self::Down => "Down",
        };
        f.write_str(name)
    }
}

/// Cycle `current` by `step` within `0..len`
pub fn wrap_index(current: usize, step: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as isize;
    ((current as isize + step).rem_euclid(len)) as usize
}

/// Move the selection one step in `direction`
pub fn move_selection(current: usize, direction: Direction, shape: &GridShape) -> usize {
    let total = shape.len();
    if total == 0 {
        return 0;
    }

    let current = current.min(total - 1);
    let Some(pos) = shape.locate(current) else {
        return 0;
    };
    let rows = shape.section_rows(pos.section);

    let next = match direction {
        Direction::Left | Direction::Right => {
            let column = wrap_index(pos.column, direction.step(), rows[pos.row]);
            shape.index_of(pos.section, pos.row, column)
        }
        Direction::Down => {
            if pos.row + 1 < rows.len() {
                shape.index_of(pos.section, pos.row + 1, pos.column)
            } else {
                match next_section(shape, pos.section) {
                    Some(section) => shape.index_of(section, 0, pos.column),
                    None => current,
                }
            }
        }
        Direction::Up => {
            if pos.row > 0 {
                shape.index_of(pos.section, pos.row - 1, pos.column)
            } else {
                match previous_section(shape, pos.section) {
                    Some(section) => {
                        let last_row = shape.section_rows(section).len() - 1;
                        shape.index_of(section, last_row, pos.column)
                    }
                    None => current,
                }
            }
        }
    };

    next.min(total - 1)
}

fn next_section(shape: &GridShape, from: Section) -> Option<Section> {
    Section::ALL
        .iter()
        .skip_while(|s| **s != from)
        .skip(1)
        .copied()
        .find(|s| !shape.section_rows(*s).is_empty())
}

fn previous_section(shape: &GridShape, from: Section) -> Option<Section> {
    Section::ALL
        .iter()
        .rev()
        .skip_while(|s| **s != from)
        .skip(1)
        .copied()
        .find(|s| !shape.section_rows(*s).is_empty())
}

//! Focus grid model
//!
//! The navigator UI is flattened into one ordered list of focusable cells:
//!
//! ```text
//! [ sentences… | words… | submit? | keyboard… ]
//! ```
//!
//! Each section is wrapped into rows. [`GridShape`] records only the row
//! lengths per section, which is all the directional move algorithm needs.
//! [`FocusGrid`] pairs that shape with the typed cells so a Select can be
//! interpreted against whatever is focused.

pub mod keyboard;
pub mod movement;

pub use keyboard::KeyboardLayout;
pub use movement::{move_selection, Direction};

use serde::Serialize;

/// Viewport width below which sentence cards stack in one column
pub const SENTENCE_BREAKPOINT: u16 = 640;

/// Upper bound on columns for sentence and word sections
pub const MAX_COLUMNS: usize = 3;

/// What a keyboard cell does when selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Input,
    Space,
    Backspace,
    Clear,
    Enter,
    Suggestion,
    Noop,
}

/// One key of the on-screen keyboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCell {
    pub row: usize,
    pub column: usize,
    pub action: KeyAction,
    pub label: String,
    pub value: Option<String>,
}

/// A focusable cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FocusCell {
    Sentence { index: usize },
    Word { index: usize },
    Submit,
    Key(KeyCell),
}

/// Grid sections, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Sentences,
    Words,
    Submit,
    Keyboard,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Sentences,
        Section::Words,
        Section::Submit,
        Section::Keyboard,
    ];

    fn slot(self) -> usize {
        match self {
            Section::Sentences => 0,
            Section::Words => 1,
            Section::Submit => 2,
            Section::Keyboard => 3,
        }
    }
}

/// A flattened index resolved into section coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub section: Section,
    pub row: usize,
    pub column: usize,
}

/// Row lengths for every section. Empty rows are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridShape {
    rows: [Vec<usize>; 4],
}

impl GridShape {
    pub fn new(
        sentences: Vec<usize>,
        words: Vec<usize>,
        submit: bool,
        keyboard: Vec<usize>,
    ) -> Self {
        let keep = |rows: Vec<usize>| rows.into_iter().filter(|len| *len > 0).collect();
        Self {
            rows: [
                keep(sentences),
                keep(words),
                if submit { vec![1] } else { Vec::new() },
                keep(keyboard),
            ],
        }
    }

    pub fn section_rows(&self, section: Section) -> &[usize] {
        &self.rows[section.slot()]
    }

    pub fn section_len(&self, section: Section) -> usize {
        self.section_rows(section).iter().sum()
    }

    /// Flattened index of the first cell of a section
    pub fn section_start(&self, section: Section) -> usize {
        Section::ALL
            .iter()
            .take_while(|s| **s != section)
            .map(|s| self.section_len(*s))
            .sum()
    }

    pub fn len(&self) -> usize {
        Section::ALL.iter().map(|s| self.section_len(*s)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a flattened index; `None` when out of range
    pub fn locate(&self, index: usize) -> Option<Position> {
        let mut remaining = index;
        for section in Section::ALL {
            for (row, len) in self.section_rows(section).iter().enumerate() {
                if remaining < *len {
                    return Some(Position {
                        section,
                        row,
                        column: remaining,
                    });
                }
                remaining -= len;
            }
        }
        None
    }

    /// Flattened index of a cell; column is clamped into the row
    pub fn index_of(&self, section: Section, row: usize, column: usize) -> usize {
        let rows = self.section_rows(section);
        let before: usize = rows.iter().take(row).sum();
        let len = rows.get(row).copied().unwrap_or(1);
        self.section_start(section) + before + column.min(len.saturating_sub(1))
    }
}

/// Wrap `count` cells into rows of `columns`; the last row may be short
pub fn wrap_rows(count: usize, columns: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let columns = columns.max(1);
    let mut rows = vec![columns; count / columns];
    if count % columns != 0 {
        rows.push(count % columns);
    }
    rows
}

/// Sentence cards stack below the breakpoint, otherwise up to three across
pub fn sentence_columns(viewport_width: u16, count: usize) -> usize {
    let viewport = if viewport_width < SENTENCE_BREAKPOINT {
        1
    } else {
        MAX_COLUMNS
    };
    viewport.min(count).max(1)
}

pub fn word_columns(count: usize) -> usize {
    count.clamp(1, MAX_COLUMNS)
}

/// Inputs the grid is derived from
#[derive(Debug, Clone, Copy)]
pub struct GridInputs<'a> {
    pub sentence_count: usize,
    pub word_count: usize,
    pub submit: bool,
    pub keyboard: Option<&'a KeyboardLayout>,
    pub viewport_width: u16,
}

/// Typed cells plus their row structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusGrid {
    cells: Vec<FocusCell>,
    shape: GridShape,
}

impl FocusGrid {
    pub fn build(inputs: GridInputs<'_>) -> Self {
        let mut cells = Vec::new();
        cells.extend((0..inputs.sentence_count).map(|index| FocusCell::Sentence { index }));
        cells.extend((0..inputs.word_count).map(|index| FocusCell::Word { index }));
        if inputs.submit {
            cells.push(FocusCell::Submit);
        }
        if let Some(layout) = inputs.keyboard {
            cells.extend(layout.cells().cloned().map(FocusCell::Key));
        }

        let shape = GridShape::new(
            wrap_rows(
                inputs.sentence_count,
                sentence_columns(inputs.viewport_width, inputs.sentence_count),
            ),
            wrap_rows(inputs.word_count, word_columns(inputs.word_count)),
            inputs.submit,
            inputs.keyboard.map(KeyboardLayout::row_lengths).unwrap_or_default(),
        );

        Self { cells, shape }
    }

    pub fn cells(&self) -> &[FocusCell] {
        &self.cells
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FocusCell> {
        self.cells.get(index)
    }
}

/// Carry a selection across a structural grid change.
///
/// The selection keeps its section and offset within it (clamped). It drops
/// back to 0 when that section vanished, or when a new suggestion round
/// replaced the sentence or word list it pointed into.
pub fn reconcile_selection(
    previous: &GridShape,
    index: usize,
    next: &GridShape,
    new_round: bool,
) -> usize {
    if next.is_empty() {
        return 0;
    }

    let Some(position) = previous.locate(index) else {
        return if new_round { 0 } else { index.min(next.len() - 1) };
    };

    if new_round && matches!(position.section, Section::Sentences | Section::Words) {
        return 0;
    }

    let offset = index - previous.section_start(position.section);
    let available = next.section_len(position.section);
    if available == 0 {
        return 0;
    }
    next.section_start(position.section) + offset.min(available - 1)
}

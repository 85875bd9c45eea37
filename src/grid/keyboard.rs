// On-screen keyboard layout
//
// Row 0 is dynamic: autocomplete words for the typed fragment, the fragment
// itself when nothing matches, or a disabled placeholder. The letter and
// control rows below it never change.

use super::{KeyAction, KeyCell};

/// Maximum autocomplete cells in the dynamic row
pub const MAX_AUTOCOMPLETE: usize = 6;

/// Label of the disabled cell shown when there is nothing to complete
pub const EMPTY_AUTOCOMPLETE_LABEL: &str = "Start typing to see suggestions";

/// Frequent English words offered as completions for the typed prefix
pub const COMMON_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "I", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
    "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
    "what", "so", "up", "out", "if", "about", "who", "get", "which", "hackathon", "go", "me",
    "when", "make", "can", "like", "time", "no", "just", "him", "know", "take", "people",
    "into", "year", "your", "good", "some", "could", "them", "see", "other", "than", "then",
    "now", "look", "only", "come", "its", "over", "think", "also", "back", "after", "use",
    "two", "how", "our", "work", "first", "well", "way", "even", "new", "want", "because",
    "any", "these", "give", "day", "most", "us",
];

const LETTER_ROWS: [&str; 3] = ["QWERTYUIOP", "ASDFGHJKL", "ZXCVBNM"];

/// Completions for a typed prefix, case-insensitive, in list order
pub fn autocomplete(fragment: &str) -> Vec<&'static str> {
    let prefix = fragment.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    COMMON_WORDS
        .iter()
        .copied()
        .filter(|word| word.to_lowercase().starts_with(&prefix))
        .take(MAX_AUTOCOMPLETE)
        .collect()
}

/// Keyboard cells grouped by row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardLayout {
    rows: Vec<Vec<KeyCell>>,
}

impl KeyboardLayout {
    /// Build the layout for the current pending fragment
    pub fn build(fragment: &str) -> Self {
        let mut rows = Vec::with_capacity(LETTER_ROWS.len() + 2);
        rows.push(dynamic_row(fragment));

        for (offset, letters) in LETTER_ROWS.iter().enumerate() {
            let row = offset + 1;
            let mut cells: Vec<KeyCell> = letters
                .chars()
                .enumerate()
                .map(|(column, letter)| KeyCell {
                    row,
                    column,
                    action: KeyAction::Input,
                    label: letter.to_string(),
                    value: Some(letter.to_ascii_lowercase().to_string()),
                })
                .collect();

            // Enter closes out the last letter row
            if offset == LETTER_ROWS.len() - 1 {
                cells.push(KeyCell {
                    row,
                    column: cells.len(),
                    action: KeyAction::Enter,
                    label: "Enter".to_string(),
                    value: None,
                });
            }
            rows.push(cells);
        }

        let control_row = LETTER_ROWS.len() + 1;
        rows.push(vec![
            KeyCell {
                row: control_row,
                column: 0,
                action: KeyAction::Space,
                label: "Space".to_string(),
                value: Some(" ".to_string()),
            },
            KeyCell {
                row: control_row,
                column: 1,
                action: KeyAction::Backspace,
                label: "Backspace".to_string(),
                value: None,
            },
            KeyCell {
                row: control_row,
                column: 2,
                action: KeyAction::Clear,
                label: "Clear".to_string(),
                value: None,
            },
        ]);

        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<KeyCell>] {
        &self.rows
    }

    pub fn row_lengths(&self) -> Vec<usize> {
        self.rows.iter().map(Vec::len).collect()
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &KeyCell> {
        self.rows.iter().flatten()
    }
}

fn dynamic_row(fragment: &str) -> Vec<KeyCell> {
    let completions = autocomplete(fragment);
    let trimmed = fragment.trim();

    let suggestion = |column: usize, word: &str| KeyCell {
        row: 0,
        column,
        action: KeyAction::Suggestion,
        label: word.to_string(),
        value: Some(word.to_string()),
    };

    if !completions.is_empty() {
        completions
            .iter()
            .enumerate()
            .map(|(column, word)| suggestion(column, word))
            .collect()
    } else if !trimmed.is_empty() {
        vec![suggestion(0, trimmed)]
    } else {
        vec![KeyCell {
            row: 0,
            column: 0,
            action: KeyAction::Noop,
            label: EMPTY_AUTOCOMPLETE_LABEL.to_string(),
            value: None,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_rows_have_expected_lengths() {
        let layout = KeyboardLayout::build("");
        assert_eq!(layout.row_lengths(), vec![1, 10, 9, 8, 3]);

        let enter = &layout.rows()[3][7];
        assert_eq!(enter.action, KeyAction::Enter);
        assert_eq!(enter.column, 7);
    }

    #[test]
    fn test_empty_fragment_shows_disabled_placeholder() {
        let layout = KeyboardLayout::build("   ");
        let row = &layout.rows()[0];
        assert_eq!(row.len(), 1);
        assert_eq!(row[0].action, KeyAction::Noop);
        assert_eq!(row[0].label, EMPTY_AUTOCOMPLETE_LABEL);
    }

    #[test]
    fn test_prefix_matches_are_capped() {
        // "t" matches the, to, that, they, there, their, time, take, ...
        let words = autocomplete("T");
        assert_eq!(words.len(), MAX_AUTOCOMPLETE);
        assert_eq!(words[0], "the");

        let layout = KeyboardLayout::build("T");
        assert!(layout.rows()[0]
            .iter()
            .all(|cell| cell.action == KeyAction::Suggestion));
    }

    #[test]
    fn test_unmatched_fragment_offers_itself() {
        let layout = KeyboardLayout::build("zq");
        let row = &layout.rows()[0];
        assert_eq!(row.len(), 1);
        assert_eq!(row[0].action, KeyAction::Suggestion);
        assert_eq!(row[0].value.as_deref(), Some("zq"));
    }

    #[test]
    fn test_letters_input_lowercase() {
        let layout = KeyboardLayout::build("");
        let q = &layout.rows()[1][0];
        assert_eq!(q.label, "Q");
        assert_eq!(q.value.as_deref(), Some("q"));
        assert_eq!(q.action, KeyAction::Input);
    }

    #[test]
    fn test_capital_i_completes_case_insensitively() {
        assert!(autocomplete("i").contains(&"I"));
    }
}

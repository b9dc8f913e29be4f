//! Character repertoires and page slicing.
//!
//! Glyph identity is positional: a page holds a row-major slice of the
//! character list, so cell (row, col) on page N always maps to the same
//! character for a given config and set.

use std::collections::BTreeSet;

use crate::config::{CharacterSet, TemplateConfig};

/// Punctuation included in the required set, beyond letters and digits.
const REQUIRED_PUNCTUATION: &[char] = &[
    '.', ',', ':', ';', '!', '?', '\'', '"', '-', '(', ')',
];

/// Extra codepoint ranges for the extended set. Kept intentionally limited
/// to Latin; anything wider belongs to a different template generation.
const EXTENDED_BLOCKS: &[(u32, u32)] = &[
    (0x00C0, 0x00FF), // Latin-1 Supplement letters
    (0x0100, 0x017F), // Latin Extended-A
];

/// Codepoints inside the extended blocks that are not letters.
const EXTENDED_EXCLUDED: &[char] = &['\u{00D7}', '\u{00F7}'];

/// The full ordered character list for a set.
///
/// Ordering is stable: required characters first in their natural order,
/// then extended codepoints ascending.
pub fn characters(set: CharacterSet) -> Vec<char> {
    let mut chars: Vec<char> = ('A'..='Z').collect();
    chars.extend('a'..='z');
    chars.extend('0'..='9');
    chars.extend(REQUIRED_PUNCTUATION.iter().copied());

    if set == CharacterSet::All {
        // BTreeSet keeps the extension deterministic while deduplicating.
        let mut extended = BTreeSet::new();
        for &(start, end) in EXTENDED_BLOCKS {
            for cp in start..=end {
                if let Some(c) = char::from_u32(cp)
                    && !EXTENDED_EXCLUDED.contains(&c)
                {
                    extended.insert(c);
                }
            }
        }
        chars.extend(extended);
    }

    chars
}

/// The characters assigned to one page, row-major. Shorter than a full page
/// on the final page; empty when `page_number` is past the end.
pub fn page_characters(set: CharacterSet, config: &TemplateConfig, page_number: usize) -> Vec<char> {
    let per_page = config.cells_per_page();
    if per_page == 0 {
        return Vec::new();
    }
    let all = characters(set);
    let start = page_number.saturating_mul(per_page);
    if start >= all.len() {
        return Vec::new();
    }
    let end = (start + per_page).min(all.len());
    all[start..end].to_vec()
}

/// Number of pages needed to cover the whole set.
pub fn page_count(set: CharacterSet, config: &TemplateConfig) -> usize {
    let per_page = config.cells_per_page();
    if per_page == 0 {
        return 0;
    }
    characters(set).len().div_ceil(per_page)
}

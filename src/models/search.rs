//! Helpers shared by the list filters: text folding, pagination, percentages

use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use utoipa::ToSchema;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Lowercase and strip diacritics so "Émile" matches "emile".
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when `needle` is blank or occurs in any of `haystacks` after folding.
pub fn matches_text<'a, I>(needle: Option<&str>, haystacks: I) -> bool
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let needle = match needle.map(str::trim) {
        None | Some("") => return true,
        Some(n) => fold(n),
    };
    haystacks
        .into_iter()
        .flatten()
        .any(|h| fold(h).contains(&needle))
}

/// `part / whole * 100`, rounded to one decimal. A zero whole yields 0.0.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    let pct = part as f64 * 100.0 / whole as f64;
    (pct * 10.0).round() / 10.0
}

/// Page request shared by list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, ToSchema)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// Rows to skip; saturates instead of overflowing on absurd page numbers.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }

    /// Slice an already-filtered list, returning the page and the total count.
    pub fn apply<T>(&self, items: Vec<T>) -> (Vec<T>, i64) {
        let total = items.len() as i64;
        let page = items
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.per_page() as usize)
            .collect();
        (page, total)
    }
}

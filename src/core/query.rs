//! Purpose: Normalize list-endpoint query parameters and define substring matching.
//! Exports: `ListParams`, `ListQuery`, `DEFAULT_LIMIT`, `MAX_LIMIT`, `MAX_SKIP`.
//! Role: Shared by both store backends so paging and filtering agree.
//! Invariants: `limit` is always within 1..=MAX_LIMIT; unusable values fall back to defaults.
//! Invariants: `skip` never exceeds `MAX_SKIP`, the largest offset the document store accepts.
//! Invariants: Each parameter degrades on its own; a repeated key keeps its first value.
//! Invariants: Search is a case-insensitive literal substring test; no term splitting.
use super::model::FlashcardSet;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;
pub const MAX_SKIP: u64 = i64::MAX as u64;

/// Raw query string values, kept as text so bad numbers degrade to defaults.
#[derive(Clone, Debug, Default)]
pub struct ListParams {
    pub q: Option<String>,
    pub limit: Option<String>,
    pub skip: Option<String>,
}

impl ListParams {
    /// Builds params from raw query pairs; the first occurrence of a key wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "q" => &mut params.q,
                "limit" => &mut params.limit,
                "skip" => &mut params.skip,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub limit: u32,
    pub skip: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl ListQuery {
    pub fn from_params(params: &ListParams) -> Self {
        let search = params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);
        let limit = params
            .limit
            .as_deref()
            .and_then(parse_whole)
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(MAX_LIMIT as u64) as u32)
            .unwrap_or(DEFAULT_LIMIT);
        let skip = params
            .skip
            .as_deref()
            .and_then(parse_whole)
            .map(|skip| skip.min(MAX_SKIP))
            .unwrap_or(0);
        Self {
            search,
            limit,
            skip,
        }
    }

    pub fn matches(&self, set: &FlashcardSet) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        let needle = term.to_lowercase();
        let hit = |text: &str| text.to_lowercase().contains(&needle);
        hit(&set.title)
            || hit(&set.description)
            || set
                .cards
                .iter()
                .any(|card| hit(&card.term) || hit(&card.definition))
    }
}

// Accepts non-negative integers and truncates fractions ("12.9" -> 12).
fn parse_whole(raw: &str) -> Option<u64> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.trunc().min(u64::MAX as f64) as u64)
}

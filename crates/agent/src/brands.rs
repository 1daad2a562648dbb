//! Fuzzy brand resolution
//!
//! The retrieval engine's brand filter is exact and cheap; resolving a
//! possibly-misspelled user string against the known brand list happens
//! here, before the query is built.

/// Resolves user-supplied brand strings against the catalog's brand list.
#[derive(Debug, Clone)]
pub struct BrandResolver {
    /// Known brands, case preserved
    brands: Vec<String>,
    /// Maximum edit distance to accept a match
    max_distance: usize,
}

impl BrandResolver {
    pub fn new(brands: &[String]) -> Self {
        Self {
            brands: brands.to_vec(),
            max_distance: 2,
        }
    }

    /// Resolve to a canonical brand name: exact case-insensitive match
    /// first, then the closest brand within the edit-distance bound.
    pub fn resolve(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(exact) = self
            .brands
            .iter()
            .find(|b| b.eq_ignore_ascii_case(input))
        {
            return Some(exact);
        }

        self.brands
            .iter()
            .map(|b| (levenshtein(input, b), b))
            .filter(|(distance, _)| *distance <= self.max_distance)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, brand)| brand.as_str())
    }
}

/// Levenshtein edit distance, case-insensitive, two-row rolling matrix
pub fn levenshtein(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.to_lowercase().chars().collect();
    let s2_chars: Vec<char> = s2.to_lowercase().chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut prev_row: Vec<usize> = (0..=len2).collect();
    let mut curr_row: Vec<usize> = vec![0; len2 + 1];

    for i in 1..=len1 {
        curr_row[0] = i;
        for j in 1..=len2 {
            let cost = usize::from(s1_chars[i - 1] != s2_chars[j - 1]);
            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[len2]
}

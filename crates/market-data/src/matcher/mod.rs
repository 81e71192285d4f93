//! Catalog code matching across marketplaces.
//!
//! Marketplaces print the same style code with different punctuation and
//! case (`DD1391-100`, `dd1391 100`, `DD1391100`). Matching happens on a
//! normalized key: ASCII letters and digits only, upper-cased.
//!
//! Ambiguity policy: the first candidate that matches wins. There is no
//! scoring beyond exact-then-containment.

/// Stateless catalog code matcher.
pub struct CatalogMatcher;

impl CatalogMatcher {
    /// Canonical comparison key for a catalog code.
    ///
    /// ```
    /// use resale_market_data::CatalogMatcher;
    ///
    /// assert_eq!(CatalogMatcher::normalize("dd1391-100"), "DD1391100");
    /// ```
    pub fn normalize(code: &str) -> String {
        code.chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    /// True when both codes normalize to the same non-empty key.
    pub fn same_code(a: &str, b: &str) -> bool {
        let a = Self::normalize(a);
        !a.is_empty() && a == Self::normalize(b)
    }

    /// Find the candidate that best matches `code`.
    ///
    /// An exact normalized match anywhere in `candidates` wins. Otherwise the
    /// first candidate whose key contains the query key, or is contained in
    /// it, is returned. Codes that normalize to nothing never match.
    pub fn find_similar<'a, S: AsRef<str>>(code: &str, candidates: &'a [S]) -> Option<&'a S> {
        Self::find_similar_by(code, candidates, |c| c.as_ref())
    }

    /// [`find_similar`](Self::find_similar) over arbitrary records.
    pub fn find_similar_by<'a, T, F>(code: &str, candidates: &'a [T], key: F) -> Option<&'a T>
    where
        F: Fn(&T) -> &str,
    {
        let wanted = Self::normalize(code);
        if wanted.is_empty() {
            return None;
        }

        let keyed: Vec<(String, &T)> = candidates
            .iter()
            .map(|c| (Self::normalize(key(c)), c))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        if let Some((_, candidate)) = keyed.iter().find(|(k, _)| *k == wanted) {
            return Some(*candidate);
        }

        keyed
            .iter()
            .find(|(k, _)| k.contains(&wanted) || wanted.contains(k.as_str()))
            .map(|(_, candidate)| *candidate)
    }
}

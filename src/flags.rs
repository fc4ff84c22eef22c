//! Search option flags.

use bitflags::bitflags;

bitflags! {
    /// Bit-mask of options controlling a single `knn`/`knn_m` call.
    ///
    /// Constructed from raw bits via [`SearchFlags::from_bits`], which rejects any bit
    /// outside those named here: a stray bit is almost always a caller mistake (a
    /// shifted or OR'd-together constant from the wrong flag set), so it is surfaced
    /// as an error instead of being silently masked away.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SearchFlags: u32 {
        /// Allow a cloud point at distance exactly zero from the query to be returned.
        /// When unset (the default), every zero-distance candidate is skipped.
        const ALLOW_SELF_MATCH = 0b01;
        /// Order the returned indices by ascending squared distance. When unset, order
        /// is unspecified but stable within a single call.
        const SORT_RESULTS = 0b10;
    }
}

impl Default for SearchFlags {
    fn default() -> Self {
        SearchFlags::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bits_accepts_known_combinations() {
        assert_eq!(
            SearchFlags::from_bits(0b11),
            Some(SearchFlags::ALLOW_SELF_MATCH | SearchFlags::SORT_RESULTS)
        );
        assert_eq!(SearchFlags::from_bits(0), Some(SearchFlags::empty()));
    }

    #[test]
    fn from_bits_rejects_unrecognised_bits() {
        assert_eq!(SearchFlags::from_bits(0b100), None);
    }
}

//! Check-digit algorithms used to confirm generic numeric matches.
//!
//! An algorithm has two faces: a native validator ([`ChecksumAlgorithm::validate`])
//! used for local evaluation, and a Painless fragment loaded through
//! [`loader::ChecksumLoader`] that generated detection scripts embed.

pub mod algorithms;
pub mod loader;

use std::fmt;
use std::str::FromStr;

pub use loader::{
    collapse_whitespace, trim_scaffold, AlgorithmLibrary, ChecksumFragment, ChecksumLoader,
    DirectoryLibrary, EmbeddedLibrary, FRAGMENT_END_MARKER, FRAGMENT_START_MARKER,
};

/// Every check-digit algorithm with a native implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    Luhn,
    AuTfn,
    AuAbn,
    AuMedicare,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 4] = [
        ChecksumAlgorithm::Luhn,
        ChecksumAlgorithm::AuTfn,
        ChecksumAlgorithm::AuAbn,
        ChecksumAlgorithm::AuMedicare,
    ];

    /// Library name of the algorithm, as referenced by `checksum:` in configs.
    pub fn name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Luhn => "luhn",
            ChecksumAlgorithm::AuTfn => "au_tfn",
            ChecksumAlgorithm::AuAbn => "au_abn",
            ChecksumAlgorithm::AuMedicare => "au_medicare",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Runs the check over a cleaned, digits-only candidate.
    pub fn validate(&self, digits: &str) -> bool {
        match self {
            ChecksumAlgorithm::Luhn => algorithms::is_valid_luhn(digits),
            ChecksumAlgorithm::AuTfn => algorithms::is_valid_au_tfn(digits),
            ChecksumAlgorithm::AuAbn => algorithms::is_valid_au_abn(digits),
            ChecksumAlgorithm::AuMedicare => algorithms::is_valid_au_medicare(digits),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = crate::errors::ProxiscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| crate::errors::ProxiscanError::AlgorithmNotFound {
            name: s.to_string(),
        })
    }
}

/// Strips everything but ASCII digits, yielding the canonical candidate string.
pub fn clean_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for algorithm in ChecksumAlgorithm::ALL {
            assert_eq!(ChecksumAlgorithm::from_name(algorithm.name()), Some(algorithm));
            assert_eq!(algorithm.name().parse::<ChecksumAlgorithm>().unwrap(), algorithm);
        }
        assert!("mod97".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn clean_digits_strips_separators() {
        assert_eq!(clean_digits("288 946-270"), "288946270");
        assert_eq!(clean_digits("abc"), "");
    }
}

//! CPF normalization.
//!
//! Clients are keyed by their CPF. Callers send it masked (`123.456.789-09`),
//! bare, or with stray whitespace; everything is compared in unmasked form.
//! Display masking is a presentation concern and lives outside this crate.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Number of digits in a CPF.
pub const CPF_LEN: usize = 11;

/// Errors produced while normalizing a CPF.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CpfError {
    /// The value does not contain exactly eleven digits.
    #[error("CPF must have 11 digits, found {0}")]
    WrongLength(usize),
}

/// Strip every character that is not an ASCII digit.
///
/// ```
/// use atendimentos_core::cpf::unmask_cpf;
///
/// assert_eq!(unmask_cpf("123.456.789-09"), "12345678909");
/// ```
#[must_use]
pub fn unmask_cpf(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// A normalized CPF: exactly eleven ASCII digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cpf(String);

impl Cpf {
    /// Normalize and validate a raw CPF.
    ///
    /// # Errors
    ///
    /// Returns [`CpfError::WrongLength`] when the unmasked value is not
    /// exactly eleven digits long.
    pub fn parse(raw: &str) -> Result<Self, CpfError> {
        let digits = unmask_cpf(raw);
        if digits.len() == CPF_LEN {
            Ok(Self(digits))
        } else {
            Err(CpfError::WrongLength(digits.len()))
        }
    }

    /// The bare eleven digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Cpf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cpf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

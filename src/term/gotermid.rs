use core::fmt::Debug;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{GoSoiError, GoSoiResult};

/// A unique identifier of a GO term, e.g. `GO:0001525`
///
/// The id is stored as its integer part only, the `GO:` prefix
/// is added again when it is displayed.
#[derive(Copy, Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GoTermId {
    inner: u32,
}

impl GoTermId {
    /// Returns the integer part of the id
    pub fn as_u32(&self) -> u32 {
        self.inner
    }
}

impl TryFrom<&str> for GoTermId {
    type Error = GoSoiError;
    /// Parses a `GO:nnnnnnn` identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use gosoi::GoTermId;
    ///
    /// let id = GoTermId::try_from("GO:0001525").unwrap();
    /// assert_eq!(id.as_u32(), 1525);
    /// assert_eq!(id.to_string(), "GO:0001525");
    ///
    /// assert!(GoTermId::try_from("HP:0001525").is_err());
    /// assert!(GoTermId::try_from("GO:15").is_err());
    /// ```
    fn try_from(s: &str) -> GoSoiResult<Self> {
        let s = s.trim();
        match s.strip_prefix("GO:") {
            Some(digits) if digits.len() == 7 && digits.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(GoTermId {
                    inner: digits.parse::<u32>()?,
                })
            }
            _ => Err(GoSoiError::InvalidTermId(s.to_string())),
        }
    }
}

impl TryFrom<String> for GoTermId {
    type Error = GoSoiError;
    fn try_from(s: String) -> GoSoiResult<Self> {
        GoTermId::try_from(s.as_str())
    }
}

impl From<GoTermId> for String {
    fn from(id: GoTermId) -> Self {
        id.to_string()
    }
}

impl From<u32> for GoTermId {
    fn from(inner: u32) -> Self {
        Self { inner }
    }
}

impl Debug for GoTermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GoTermId({self})")
    }
}

impl Display for GoTermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GO:{:07}", self.inner)
    }
}

impl PartialEq<str> for GoTermId {
    fn eq(&self, other: &str) -> bool {
        GoTermId::try_from(other).map_or(false, |other| *self == other)
    }
}

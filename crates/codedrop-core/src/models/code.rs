use std::borrow::Borrow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::{CODE_LENGTH, CODE_MAX, CODE_MIN};

/// Reasons a string is not a valid transfer code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeParseError {
    #[error("code must be exactly {expected} digits, got {found} characters")]
    Length { expected: usize, found: usize },

    #[error("code must contain only ASCII digits")]
    NonDigit,

    #[error("code {0} is outside the issuable range")]
    OutOfRange(u32),
}

/// A six-digit transfer code in `100000..=999999`.
///
/// Codes are only constructed through validation, so holding a `Code` means the
/// format has already been checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    /// Build a code from its numeric value.
    pub fn from_number(value: u32) -> Result<Self, CodeParseError> {
        if !(CODE_MIN..=CODE_MAX).contains(&value) {
            return Err(CodeParseError::OutOfRange(value));
        }
        Ok(Code(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Code {
    type Err = CodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != CODE_LENGTH {
            return Err(CodeParseError::Length {
                expected: CODE_LENGTH,
                found: s.chars().count(),
            });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodeParseError::NonDigit);
        }
        let value: u32 = s.parse().map_err(|_| CodeParseError::NonDigit)?;
        Code::from_number(value)
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Code {
    fn borrow(&self) -> &str {
        &self.0
    }
}

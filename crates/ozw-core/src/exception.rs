// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The native exception taxonomy.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::Display;
use thiserror::Error;

/// Category of a native failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ExceptionKind {
    Options = 0,
    Config = 1,
    InvalidHomeId = 2,
    InvalidValueId = 3,
    CannotConvertValueId = 4,
    SecurityFailed = 5,
    InvalidNodeId = 6,
}

impl ExceptionKind {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Options => "Options",
            Self::Config => "Config",
            Self::InvalidHomeId => "InvalidHomeId",
            Self::InvalidValueId => "InvalidValueId",
            Self::CannotConvertValueId => "CannotConvertValueId",
            Self::SecurityFailed => "SecurityFailed",
            Self::InvalidNodeId => "InvalidNodeId",
        }
    }
}

impl Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure raised by the native library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct OzwException {
    kind: ExceptionKind,
    message: String,
}

impl OzwException {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ExceptionKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn options(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Options, message)
    }

    pub fn invalid_home_id(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::InvalidHomeId, message)
    }

    pub fn invalid_value_id(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::InvalidValueId, message)
    }

    pub fn cannot_convert(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::CannotConvertValueId, message)
    }

    pub fn invalid_node_id(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::InvalidNodeId, message)
    }
}

/// Result of a call into the native library.
pub type NativeResult<T> = Result<T, OzwException>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let e = OzwException::invalid_home_id("Invalid HomeId passed to GetDriver");
        assert_eq!(
            e.to_string(),
            "InvalidHomeId: Invalid HomeId passed to GetDriver"
        );
    }

    #[test]
    fn test_kind_ordinals_are_contiguous() {
        for raw in 0u8..7 {
            let kind = ExceptionKind::try_from(raw).unwrap();
            assert_eq!(u8::from(kind), raw);
        }
        assert!(ExceptionKind::try_from(7u8).is_err());
    }
}

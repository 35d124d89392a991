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

//! Failures detected at the boundary itself, before any native call.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FfiError {
    /// No live singleton of this kind exists.
    #[error("no live {0} instance")]
    NoInstance(&'static str),

    /// The handle was issued for a singleton that has since been destroyed.
    #[error("stale {0} handle")]
    StaleHandle(&'static str),

    #[error("string argument is not valid UTF-8")]
    InvalidUtf8,

    #[error("string contains an interior NUL byte")]
    InteriorNul,

    /// Neither a registered backend nor the in-process fallback exists.
    #[error("no backend registered")]
    NoBackend,

    #[error("backend cannot change while a manager or options are live")]
    BackendInUse,

    /// An integer from the host names no variant of the enum.
    #[error("{value} is not a valid {kind}")]
    OutOfRange { kind: &'static str, value: i64 },
}

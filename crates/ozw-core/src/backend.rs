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

//! The library entry points: singleton lifecycle and version queries.
//!
//! A backend owns the process-wide manager and options. The bindings reach
//! the native library only through the backend they were given, so a build
//! against the real library and the in-process stand-in share one facade.

use crate::exception::NativeResult;
use crate::manager::Manager;
use crate::options::Options;
use std::sync::Arc;

/// The native library's static entry points.
pub trait Backend: Send + Sync {
    /// Creates the options, or returns the live instance.
    fn create_options(&self, config_path: &str, user_path: &str, command_line: &str) -> Arc<dyn Options>;

    /// Destroys the options. Fails while a manager exists.
    fn destroy_options(&self) -> bool;

    /// Creates the manager. Fails unless the options exist and are locked.
    fn create_manager(&self) -> NativeResult<Arc<dyn Manager>>;

    /// Destroys the manager after delivering pending notifications.
    fn destroy_manager(&self);

    fn version_as_string(&self) -> String;

    fn version_long_as_string(&self) -> String;

    /// The version as `(major, minor)`.
    fn version(&self) -> (u16, u16);
}

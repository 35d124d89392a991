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

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Declared type of a registered option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OptionType {
    Invalid = 0,
    Bool = 1,
    Int = 2,
    String = 3,
}

/// The native options store.
///
/// Options are registered with a default while unlocked, then frozen by
/// [`Options::lock`]. Locking applies values from the configuration files
/// and the command line. Registration after locking fails.
pub trait Options: Send + Sync {
    /// Freezes the option set. Returns `false` if already locked.
    fn lock(&self) -> bool;

    fn are_locked(&self) -> bool;

    fn add_option_bool(&self, name: &str, default: bool) -> bool;

    fn add_option_int(&self, name: &str, default: i32) -> bool;

    /// Registers a string option. An appending option concatenates every
    /// value supplied for it, separated by commas.
    fn add_option_string(&self, name: &str, default: &str, append: bool) -> bool;

    fn get_option_as_bool(&self, name: &str) -> Option<bool>;

    fn get_option_as_int(&self, name: &str) -> Option<i32>;

    fn get_option_as_string(&self, name: &str) -> Option<String>;

    fn get_option_type(&self, name: &str) -> OptionType;
}

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

//! # OZW Virtual
//!
//! An in-process stand-in for the native OpenZWave library. It implements
//! the `ozw-core` traits against a simulated controller so the C bindings
//! can be driven and tested without Z-Wave hardware.
//!
//! ## Overview
//!
//! - Every driver added to the manager starts a virtual controller with a
//!   fixed device inventory (see `inventory`).
//! - Operations follow the native library's contracts: unknown home ids,
//!   node ids and value ids raise the matching native exception, and type
//!   mismatches raise `CannotConvertValueId`.
//! - Notifications are delivered in order from a dedicated thread.
//!
//! ## Modules
//!
//! - `options`: The options store and its process-wide instance.
//! - `manager`: The manager and its process-wide instance.
//! - `driver`: A virtual controller and its network.
//! - `node`, `value`: Node and value storage.
//! - `scene`: Scene storage.
//! - `notifier`: Watcher registry and notification thread.
//! - `inventory`: The devices every controller starts with.
//!
//! [`VirtualBackend`] hands the process-wide instances to the bindings.

use ozw_core::backend::Backend;
use ozw_core::exception::NativeResult;
use ozw_core::manager::Manager;
use ozw_core::options::Options;
use std::sync::Arc;

pub mod driver;
pub mod inventory;
pub mod manager;
pub mod node;
pub mod notifier;
pub mod options;
pub mod scene;
pub mod value;

const VERSION_MAJOR: u16 = 1;
const VERSION_MINOR: u16 = 4;
const VERSION_REVISION: u16 = 0;

/// The library version as `major.minor.revision`.
pub fn version_as_string() -> String {
    format!("{}.{}.{}", VERSION_MAJOR, VERSION_MINOR, VERSION_REVISION)
}

/// The library version including the build flavour.
pub fn version_long_as_string() -> String {
    format!("{}-virtual", version_as_string())
}

/// The library version as `(major, minor)`.
pub fn version() -> (u16, u16) {
    (VERSION_MAJOR, VERSION_MINOR)
}

/// The in-process library behind the `ozw-core` backend seam.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualBackend;

impl Backend for VirtualBackend {
    fn create_options(&self, config_path: &str, user_path: &str, command_line: &str) -> Arc<dyn Options> {
        options::create(config_path, user_path, command_line)
    }

    fn destroy_options(&self) -> bool {
        options::destroy()
    }

    fn create_manager(&self) -> NativeResult<Arc<dyn Manager>> {
        let manager: Arc<dyn Manager> = manager::create()?;
        Ok(manager)
    }

    fn destroy_manager(&self) {
        manager::destroy();
    }

    fn version_as_string(&self) -> String {
        version_as_string()
    }

    fn version_long_as_string(&self) -> String {
        version_long_as_string()
    }

    fn version(&self) -> (u16, u16) {
        version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_strings() {
        assert_eq!(version_as_string(), "1.4.0");
        assert!(version_long_as_string().starts_with("1.4.0"));
        assert_eq!(version(), (1, 4));
    }

    #[test]
    fn test_backend_reports_library_version() {
        let backend: &dyn Backend = &VirtualBackend;
        assert_eq!(backend.version(), version());
        assert_eq!(backend.version_as_string(), "1.4.0");
        assert!(backend.version_long_as_string().ends_with("-virtual"));
    }
}

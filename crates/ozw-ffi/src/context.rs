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

//! The process context: the live singletons and the tokens that name them.
//!
//! Handles are resolved here on every call. Resolution clones the `Arc` out
//! of the slot and releases the lock before the native call runs, so the
//! lock is never held across a call into the native library.
//!
//! Creation and destruction of the singletons are serialized by a second
//! lock, `lifecycle`, held from the liveness check through the native call
//! and the install. Resolution never waits on it.
//!
//! The native library itself is reached through a [`Backend`]. Hosts linking
//! the bindings from Rust register one with [`set_backend`]. Without one, the
//! `virtual` feature falls back to the in-process library.

use crate::error::FfiError;
use crate::handle::{next_token, ZwManager, ZwOptions};
use ozw_core::backend::Backend;
use ozw_core::exception::NativeResult;
use ozw_core::manager::Manager;
use ozw_core::options::Options;
use parking_lot::{const_mutex, Mutex, MutexGuard};
use std::ffi::CStr;
use std::sync::Arc;

struct Slot<T: ?Sized> {
    token: usize,
    instance: Arc<T>,
}

struct Context {
    backend: Option<Arc<dyn Backend>>,
    manager: Option<Slot<dyn Manager>>,
    options: Option<Slot<dyn Options>>,
}

static CONTEXT: Mutex<Context> = const_mutex(Context {
    backend: None,
    manager: None,
    options: None,
});

static LIFECYCLE: Mutex<()> = const_mutex(());

/// Serializes creation and destruction of the manager and options.
pub(crate) fn lifecycle() -> MutexGuard<'static, ()> {
    LIFECYCLE.lock()
}

/// Registers the native library the bindings call into.
///
/// Fails with [`FfiError::BackendInUse`] while a manager or options are live.
pub fn set_backend(backend: Arc<dyn Backend>) -> Result<(), FfiError> {
    let _lifecycle = lifecycle();
    let mut context = CONTEXT.lock();
    if context.manager.is_some() || context.options.is_some() {
        return Err(FfiError::BackendInUse);
    }
    context.backend = Some(backend);
    Ok(())
}

#[cfg(feature = "virtual")]
fn fallback_backend() -> Option<Arc<dyn Backend>> {
    Some(Arc::new(ozw_virtual::VirtualBackend))
}

#[cfg(not(feature = "virtual"))]
fn fallback_backend() -> Option<Arc<dyn Backend>> {
    None
}

/// The registered backend, logging its absence.
pub(crate) fn backend(function: &'static str) -> Option<Arc<dyn Backend>> {
    let mut context = CONTEXT.lock();
    if context.backend.is_none() {
        context.backend = fallback_backend();
    }
    let backend = context.backend.clone();
    if backend.is_none() {
        tracing::error!(function, error = %FfiError::NoBackend, "native library unreachable");
    }
    backend
}

fn resolve<T: ?Sized>(slot: &Option<Slot<T>>, token: usize, kind: &'static str) -> Result<Arc<T>, FfiError> {
    match slot {
        _ if token == 0 => Err(FfiError::NoInstance(kind)),
        Some(slot) if slot.token == token => Ok(Arc::clone(&slot.instance)),
        _ => Err(FfiError::StaleHandle(kind)),
    }
}

/// Installs the manager and returns its handle.
pub(crate) fn install_manager(manager: Arc<dyn Manager>) -> *mut ZwManager {
    let token = next_token();
    CONTEXT.lock().manager = Some(Slot {
        token,
        instance: manager,
    });
    token as *mut ZwManager
}

/// Clears the manager slot. Every handle issued so far becomes stale.
pub(crate) fn take_manager() -> Option<Arc<dyn Manager>> {
    CONTEXT.lock().manager.take().map(|slot| slot.instance)
}

/// Handle of the live manager, or null.
pub(crate) fn manager_handle() -> *mut ZwManager {
    CONTEXT
        .lock()
        .manager
        .as_ref()
        .map_or(std::ptr::null_mut(), |slot| slot.token as *mut ZwManager)
}

/// The live manager, if any.
pub(crate) fn live_manager() -> Option<Arc<dyn Manager>> {
    CONTEXT.lock().manager.as_ref().map(|slot| Arc::clone(&slot.instance))
}

/// Installs the options and returns their handle.
pub(crate) fn install_options(options: Arc<dyn Options>) -> *mut ZwOptions {
    let token = next_token();
    CONTEXT.lock().options = Some(Slot {
        token,
        instance: options,
    });
    token as *mut ZwOptions
}

pub(crate) fn take_options() -> Option<Arc<dyn Options>> {
    CONTEXT.lock().options.take().map(|slot| slot.instance)
}

/// Handle of the live options, or null.
pub(crate) fn options_handle() -> *mut ZwOptions {
    CONTEXT
        .lock()
        .options
        .as_ref()
        .map_or(std::ptr::null_mut(), |slot| slot.token as *mut ZwOptions)
}

/// Resolves a manager handle, logging a rejected one.
pub(crate) fn manager(handle: *const ZwManager, function: &'static str) -> Option<Arc<dyn Manager>> {
    let resolved = resolve(&CONTEXT.lock().manager, handle as usize, "manager");
    resolved
        .map_err(|error| tracing::warn!(function, %error, "rejected manager handle"))
        .ok()
}

/// Resolves an options handle, logging a rejected one.
pub(crate) fn options(handle: *const ZwOptions, function: &'static str) -> Option<Arc<dyn Options>> {
    let resolved = resolve(&CONTEXT.lock().options, handle as usize, "options");
    resolved
        .map_err(|error| tracing::warn!(function, %error, "rejected options handle"))
        .ok()
}

/// Resolves the handle and runs a native call, logging a native exception.
///
/// Returns `None` when the handle was rejected or the call raised.
pub(crate) fn call<T>(
    handle: *const ZwManager,
    function: &'static str,
    f: impl FnOnce(&dyn Manager) -> NativeResult<T>,
) -> Option<T> {
    let manager = manager(handle, function)?;
    match f(manager.as_ref()) {
        Ok(value) => Some(value),
        Err(exception) => {
            tracing::warn!(
                function,
                kind = exception.kind().as_str(),
                message = exception.message(),
                "native exception"
            );
            None
        }
    }
}

/// Borrows a C string argument.
///
/// # Panics
///
/// Panics if `ptr` is null.
///
/// # Safety
///
/// `ptr` must point to a NUL-terminated string that stays valid for `'a`.
pub(crate) unsafe fn str_arg<'a>(ptr: *const libc::c_char, function: &'static str) -> Result<&'a str, FfiError> {
    assert!(!ptr.is_null(), "called `{}` with null string pointer", function);
    CStr::from_ptr(ptr).to_str().map_err(|_| FfiError::InvalidUtf8)
}

/// Like [`str_arg`], logging a rejected string.
///
/// # Safety
///
/// See [`str_arg`].
pub(crate) unsafe fn checked_str<'a>(ptr: *const libc::c_char, function: &'static str) -> Option<&'a str> {
    str_arg(ptr, function)
        .map_err(|error| tracing::warn!(function, %error, "rejected string argument"))
        .ok()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::driver::{zw_manager_add_driver, ZwControllerInterface};
    use crate::handle::{ZwManager, ZwOptions};
    use crate::manager::{zw_manager_create, zw_manager_destroy};
    use crate::options::{zw_options_create, zw_options_destroy, zw_options_lock};
    use ozw_virtual::VirtualBackend;
    use parking_lot::{const_mutex, Mutex, MutexGuard};
    use std::sync::Arc;

    static SINGLETONS: Mutex<()> = const_mutex(());

    /// Serializes tests that create or destroy the process-wide singletons.
    /// The in-process library is registered as the backend.
    pub(crate) fn singletons() -> MutexGuard<'static, ()> {
        let guard = SINGLETONS.lock();
        super::set_backend(Arc::new(VirtualBackend)).expect("no singleton outlives its test");
        guard
    }

    /// Locked options, a manager and one driver on `"usb"`. Torn down on drop.
    pub(crate) struct Network {
        pub options: *mut ZwOptions,
        pub manager: *mut ZwManager,
        pub home_id: u32,
        _guard: MutexGuard<'static, ()>,
    }

    impl Network {
        pub(crate) fn start() -> Self {
            let guard = singletons();
            let empty = b"\0".as_ptr().cast();
            unsafe {
                let options = zw_options_create(empty, empty, empty);
                assert!(zw_options_lock(options));
                let manager = zw_manager_create();
                assert!(!manager.is_null());
                assert!(zw_manager_add_driver(manager, b"usb\0".as_ptr().cast(), ZwControllerInterface::Serial as i32));
                Self {
                    options,
                    manager,
                    home_id: ozw_virtual::driver::home_id_for_path("usb"),
                    _guard: guard,
                }
            }
        }
    }

    impl Drop for Network {
        fn drop(&mut self) {
            zw_manager_destroy();
            zw_options_destroy();
        }
    }
}

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

//! # OZW FFI
//!
//! **C-Compatible Bindings for the OpenZWave Network Manager.**
//!
//! This crate is the boundary between a Z-Wave network manager and foreign
//! host runtimes. It exposes the manager, its options and its notification
//! stream through a flat `extern "C"` API built around **opaque handles** and
//! **explicitly freed buffers**.
//!
//! ## Core Design Principles
//!
//! 1.  **Opaque Handles**: The manager and options singletons are reached
//!     through `ZwManager` / `ZwOptions` pointers. A handle is a generation
//!     token, never an address: a handle that outlived its singleton is
//!     rejected and logged, not dereferenced. Value identifiers cross the
//!     boundary by value as `ZwValueId`.
//! 2.  **Explicit Ownership**: Every buffer returned by pointer (`ZwString`,
//!     `ZwBytes`, `ZwStringList`, `ZwIntList`, `ZwValueResult`,
//!     `ZwNotification`) belongs to the caller and must be released exactly
//!     once with its `_free` function. Buffers the caller passes in stay
//!     owned by the caller.
//! 3.  **No Exceptions Across the Boundary**: Native failures are caught at
//!     the call site. Value operations report them in a `ZwValueResult`;
//!     other operations return a neutral value (`false`, `0`, null) and log
//!     the failure through `tracing`.
//! 4.  **Fail-Fast Preconditions**: Null buffer pointers and out-of-range
//!     indices panic. A panic cannot unwind through `extern "C"`, so the
//!     process aborts instead of reading invalid memory.
//! 5.  **Integers In, Enums Out**: Enumerations passed by the host are read
//!     as `i32` and checked. An integer that names no variant yields
//!     `"Unknown"` or the function's neutral value.
//!
//! ## Backends
//!
//! The facade reaches the native library through an `ozw_core` backend.
//! A Rust host registers one with `context::set_backend` before creating the
//! options. With the default `virtual` feature, the in-process library from
//! `ozw-virtual` serves when none was registered.
//!
//! ## Modules
//!
//! * `handle`: Opaque handles and value identifiers.
//! * `buffer`: Owned strings, byte arrays, string lists and integer lists.
//! * `result`: The value result envelope.
//! * `options`: The options facade.
//! * `manager`, `driver`, `node`, `value`, `group`, `scene`: The manager facade.
//! * `notification`: Watcher hooks and the notification queue.

/// Name returned for an integer that names no enum variant.
pub(crate) const UNKNOWN: &str = "Unknown\0";

/// Declares a C enum that mirrors a native enum variant for variant, with
/// conversions both ways and static C names.
///
/// The enum is `int` sized. Arguments arrive from the host as raw `i32` and
/// go through `from_raw`, never straight into the enum.
macro_rules! mirror_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident mirrors $native:ident {
            $($variant:ident = $value:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::TryFromPrimitive)]
        pub enum $name {
            $($variant = $value),*
        }

        impl $name {
            /// The variant name as a static NUL-terminated string.
            #[inline]
            pub fn c_name(&self) -> *const libc::c_char {
                match self {
                    $(Self::$variant => concat!(stringify!($variant), "\0").as_ptr().cast()),*
                }
            }

            /// Reads an integer passed by the host, logging one that names
            /// no variant.
            pub fn from_raw(raw: i32, function: &'static str) -> Option<Self> {
                Self::try_from(raw)
                    .map_err(|_| {
                        let error = crate::error::FfiError::OutOfRange {
                            kind: stringify!($name),
                            value: raw.into(),
                        };
                        tracing::warn!(function, %error, "rejected enum argument");
                    })
                    .ok()
            }

            /// Static name of the variant `raw` names, or `"Unknown"`.
            pub fn c_name_of(raw: i32, function: &'static str) -> *const libc::c_char {
                Self::from_raw(raw, function).map_or(crate::UNKNOWN.as_ptr().cast(), |v| v.c_name())
            }
        }

        impl From<$native> for $name {
            #[inline]
            fn from(value: $native) -> Self {
                match value {
                    $($native::$variant => Self::$variant),*
                }
            }
        }

        impl From<$name> for $native {
            #[inline]
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => Self::$variant),*
                }
            }
        }
    };
}

/// Exports `zw_manager_<name>` functions that forward to one manager method.
///
/// A rejected handle or a native exception is logged and yields the return
/// type's default: `false`, `0` or nothing.
macro_rules! forward {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)? => $method:ident;
    )*) => {
        paste::paste! {$(
            $(#[$meta])*
            #[no_mangle]
            pub extern "C" fn [<zw_manager_ $name>](
                manager: *const crate::handle::ZwManager,
                $($arg: $ty),*
            ) $(-> $ret)? {
                crate::context::call(manager, stringify!([<zw_manager_ $name>]), |m| m.$method($($arg),*))
                    .unwrap_or_default()
            }
        )*}
    };
}

/// Exports `zw_manager_<name>` functions returning an owned `ZwString`, or
/// null if the handle is rejected or the call raises.
macro_rules! forward_string {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) => $method:ident;
    )*) => {
        paste::paste! {$(
            $(#[$meta])*
            #[no_mangle]
            pub extern "C" fn [<zw_manager_ $name>](
                manager: *const crate::handle::ZwManager,
                $($arg: $ty),*
            ) -> *mut crate::buffer::ZwString {
                crate::context::call(manager, stringify!([<zw_manager_ $name>]), |m| m.$method($($arg),*))
                    .map_or(std::ptr::null_mut(), |s| crate::buffer::ZwString::new_owned(&s))
            }
        )*}
    };
}

pub mod buffer;
pub mod context;
pub mod driver;
pub mod error;
pub mod group;
pub mod handle;
pub mod manager;
pub mod node;
pub mod notification;
pub mod options;
pub mod result;
pub mod scene;
pub mod value;

/// Installs a `tracing` subscriber that writes to stderr.
///
/// The filter is read from `RUST_LOG` and defaults to `info`. Calling this
/// more than once, or after the host installed its own subscriber, has no
/// effect.
#[no_mangle]
pub extern "C" fn zw_log_init() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "ozw-ffi logging initialized");
    }
}

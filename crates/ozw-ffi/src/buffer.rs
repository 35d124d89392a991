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

//! # Owned Buffers
//!
//! Flat `{pointer, length}` containers for data crossing the boundary.
//!
//! ## Ownership
//!
//! * A buffer returned by pointer belongs to the caller, who releases it
//!   exactly once with the matching `_free` function. Freeing twice is
//!   undefined behaviour.
//! * A buffer the caller passes in (for example a `ZwString` on the caller's
//!   stack) stays owned by the caller. Functions filling it release its
//!   previous contents first. Such a buffer must be emptied with `_init(.., 0)`
//!   rather than passed to `_free`.
//! * A zero-length buffer always has a null data pointer.
//! * `ZwString` data carries a trailing NUL that `length` does not count, so
//!   `data` is also a valid C string.
//!
//! ## Safety
//!
//! Indexing past `length` panics. The `length` field must not be modified
//! by the caller: it determines how much memory `_free` releases.
//!
//! ## Exported Functions
//!
//! ### Strings
//! * `zw_string_empty`
//! * `zw_string_init`
//! * `zw_string_free`
//!
//! ### Byte Arrays
//! * `zw_bytes_empty`
//! * `zw_bytes_init`
//! * `zw_bytes_set`
//! * `zw_bytes_at`
//! * `zw_bytes_free`
//!
//! ### String Lists
//! * `zw_string_list_empty`
//! * `zw_string_list_init`
//! * `zw_string_list_at`
//! * `zw_string_list_free`
//!
//! ### Integer Lists
//! * `zw_int_list_empty`
//! * `zw_int_list_init`
//! * `zw_int_list_at`
//! * `zw_int_list_free`

use libc::c_char;
use std::ptr::{null_mut, slice_from_raw_parts_mut};

#[cfg(test)]
thread_local! {
    static LIVE_ALLOCATIONS: std::cell::Cell<isize> = const { std::cell::Cell::new(0) };
}

#[inline]
fn track(_delta: isize) {
    #[cfg(test)]
    LIVE_ALLOCATIONS.with(|live| live.set(live.get() + _delta));
}

/// Allocations made by this thread and not yet released.
#[cfg(test)]
pub(crate) fn live_allocations() -> isize {
    LIVE_ALLOCATIONS.with(|live| live.get())
}

/// Moves a slice to the heap and returns its data pointer, or null if empty.
fn alloc_slice<T>(data: Box<[T]>) -> *mut T {
    if data.is_empty() {
        return null_mut();
    }
    track(1);
    Box::into_raw(data).cast()
}

/// Releases a slice allocated by [`alloc_slice`].
///
/// # Safety
///
/// `data` must be null or come from `alloc_slice` with exactly `len` elements.
unsafe fn free_slice<T>(data: *mut T, len: usize) {
    if data.is_null() {
        return;
    }
    track(-1);
    drop(Box::from_raw(slice_from_raw_parts_mut(data, len)));
}

pub(crate) fn alloc_box<T>(value: T) -> *mut T {
    track(1);
    Box::into_raw(Box::new(value))
}

/// # Safety
///
/// `ptr` must be non-null and come from [`alloc_box`].
pub(crate) unsafe fn free_box<T>(ptr: *mut T) -> T {
    track(-1);
    *Box::from_raw(ptr)
}

/// An owned, NUL-terminated string.
#[repr(C)]
#[derive(Debug)]
pub struct ZwString {
    pub data: *mut c_char,
    pub length: usize,
}

impl ZwString {
    const EMPTY: Self = Self {
        data: null_mut(),
        length: 0,
    };

    /// Replaces the contents with a copy of `bytes` plus a trailing NUL.
    ///
    /// # Safety
    ///
    /// The current contents must have been allocated by this module.
    pub(crate) unsafe fn assign(&mut self, bytes: &[u8]) {
        self.release();
        if bytes.is_empty() {
            return;
        }
        let mut data = Vec::with_capacity(bytes.len() + 1);
        data.extend_from_slice(bytes);
        data.push(0u8);
        self.data = alloc_slice(data.into_boxed_slice()).cast();
        self.length = bytes.len();
    }

    /// # Safety
    ///
    /// The current contents must have been allocated by this module.
    unsafe fn release(&mut self) {
        free_slice(self.data.cast::<u8>(), self.length + 1);
        *self = Self::EMPTY;
    }

    /// Returns the contents as a byte slice.
    ///
    /// # Safety
    ///
    /// `data` must be null or valid for `length` bytes.
    pub unsafe fn as_bytes(&self) -> &[u8] {
        if self.data.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(self.data.cast::<u8>(), self.length)
    }

    /// Heap-allocates a copy of `s` for the caller.
    pub(crate) fn new_owned(s: &str) -> *mut ZwString {
        let ptr = alloc_box(Self::EMPTY);
        unsafe { (*ptr).assign(s.as_bytes()) };
        ptr
    }
}

/// Creates an empty string. Free it with `zw_string_free`.
#[no_mangle]
pub extern "C" fn zw_string_empty() -> *mut ZwString {
    alloc_box(ZwString::EMPTY)
}

/// Resizes the string to `size` bytes, all zero, releasing its previous
/// contents first. A `size` of zero leaves it empty with a null `data`.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid and that its contents
/// were allocated by this library.
#[no_mangle]
pub unsafe extern "C" fn zw_string_init(string: *mut ZwString, size: usize) {
    assert!(!string.is_null(), "called `zw_string_init` with null pointer");
    let string = &mut *string;
    string.release();
    if size > 0 {
        string.data = alloc_slice(vec![0u8; size + 1].into_boxed_slice()).cast();
        string.length = size;
    }
}

/// Frees a string returned by this library, including its contents.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is null or was returned by this
/// library and has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn zw_string_free(string: *mut ZwString) {
    if string.is_null() {
        return;
    }
    let mut string = free_box(string);
    string.release();
}

/// An owned byte array.
#[repr(C)]
#[derive(Debug)]
pub struct ZwBytes {
    pub data: *mut u8,
    pub length: usize,
}

impl ZwBytes {
    const EMPTY: Self = Self {
        data: null_mut(),
        length: 0,
    };

    unsafe fn release(&mut self) {
        free_slice(self.data, self.length);
        *self = Self::EMPTY;
    }

    /// # Safety
    ///
    /// `data` must be null or valid for `length` bytes.
    pub unsafe fn as_slice(&self) -> &[u8] {
        if self.data.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(self.data, self.length)
    }

    pub(crate) fn new_owned(bytes: Vec<u8>) -> *mut ZwBytes {
        let length = bytes.len();
        alloc_box(Self {
            data: alloc_slice(bytes.into_boxed_slice()),
            length,
        })
    }
}

/// Creates an empty byte array. Free it with `zw_bytes_free`.
#[no_mangle]
pub extern "C" fn zw_bytes_empty() -> *mut ZwBytes {
    alloc_box(ZwBytes::EMPTY)
}

/// Resizes the array to `size` zero bytes, releasing its previous contents
/// first.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid and that its contents
/// were allocated by this library.
#[no_mangle]
pub unsafe extern "C" fn zw_bytes_init(bytes: *mut ZwBytes, size: usize) {
    assert!(!bytes.is_null(), "called `zw_bytes_init` with null pointer");
    let bytes = &mut *bytes;
    bytes.release();
    bytes.data = alloc_slice(vec![0u8; size].into_boxed_slice());
    bytes.length = size;
}

/// Sets the byte at `pos`.
///
/// # Panics
///
/// This function will panic if called with a null pointer or if `pos` is
/// out of bounds.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid.
#[no_mangle]
pub unsafe extern "C" fn zw_bytes_set(bytes: *mut ZwBytes, pos: usize, value: u8) {
    assert!(!bytes.is_null(), "called `zw_bytes_set` with null pointer");
    let bytes = &mut *bytes;
    assert!(
        pos < bytes.length,
        "called `zw_bytes_set` with index out of bounds: the len is {} but the index is {}",
        bytes.length,
        pos
    );
    *bytes.data.add(pos) = value;
}

/// Returns the byte at `pos`.
///
/// # Panics
///
/// This function will panic if called with a null pointer or if `pos` is
/// out of bounds.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid.
#[no_mangle]
pub unsafe extern "C" fn zw_bytes_at(bytes: *const ZwBytes, pos: usize) -> u8 {
    assert!(!bytes.is_null(), "called `zw_bytes_at` with null pointer");
    let bytes = &*bytes;
    assert!(
        pos < bytes.length,
        "called `zw_bytes_at` with index out of bounds: the len is {} but the index is {}",
        bytes.length,
        pos
    );
    *bytes.data.add(pos)
}

/// Frees a byte array returned by this library, including its contents.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is null or was returned by this
/// library and has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn zw_bytes_free(bytes: *mut ZwBytes) {
    if bytes.is_null() {
        return;
    }
    let mut bytes = free_box(bytes);
    bytes.release();
}

/// An owned list of owned strings.
#[repr(C)]
#[derive(Debug)]
pub struct ZwStringList {
    pub list: *mut *mut ZwString,
    pub length: usize,
}

impl ZwStringList {
    const EMPTY: Self = Self {
        list: null_mut(),
        length: 0,
    };

    /// Frees every string, then the array.
    unsafe fn release(&mut self) {
        if !self.list.is_null() {
            for i in 0..self.length {
                zw_string_free(*self.list.add(i));
            }
        }
        free_slice(self.list, self.length);
        *self = Self::EMPTY;
    }

    pub(crate) fn new_owned<S: AsRef<str>>(items: &[S]) -> *mut ZwStringList {
        let strings: Vec<*mut ZwString> = items
            .iter()
            .map(|item| ZwString::new_owned(item.as_ref()))
            .collect();
        let length = strings.len();
        alloc_box(Self {
            list: alloc_slice(strings.into_boxed_slice()),
            length,
        })
    }
}

/// Creates an empty string list. Free it with `zw_string_list_free`.
#[no_mangle]
pub extern "C" fn zw_string_list_empty() -> *mut ZwStringList {
    alloc_box(ZwStringList::EMPTY)
}

/// Resizes the list to `size` empty strings, releasing its previous
/// contents first.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid and that its contents
/// were allocated by this library.
#[no_mangle]
pub unsafe extern "C" fn zw_string_list_init(list: *mut ZwStringList, size: usize) {
    assert!(!list.is_null(), "called `zw_string_list_init` with null pointer");
    let list = &mut *list;
    list.release();
    let strings: Vec<*mut ZwString> = (0..size).map(|_| zw_string_empty()).collect();
    list.list = alloc_slice(strings.into_boxed_slice());
    list.length = size;
}

/// Borrows the string at `pos`. The string stays owned by the list.
///
/// # Panics
///
/// This function will panic if called with a null pointer or if `pos` is
/// out of bounds.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid.
#[no_mangle]
pub unsafe extern "C" fn zw_string_list_at(list: *const ZwStringList, pos: usize) -> *const ZwString {
    assert!(!list.is_null(), "called `zw_string_list_at` with null pointer");
    let list = &*list;
    assert!(
        pos < list.length,
        "called `zw_string_list_at` with index out of bounds: the len is {} but the index is {}",
        list.length,
        pos
    );
    *list.list.add(pos)
}

/// Frees a string list returned by this library: every string, then the
/// array, then the list itself.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is null or was returned by this
/// library and has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn zw_string_list_free(list: *mut ZwStringList) {
    if list.is_null() {
        return;
    }
    let mut list = free_box(list);
    list.release();
}

/// An owned list of 32-bit integers.
#[repr(C)]
#[derive(Debug)]
pub struct ZwIntList {
    pub data: *mut i32,
    pub length: usize,
}

impl ZwIntList {
    const EMPTY: Self = Self {
        data: null_mut(),
        length: 0,
    };

    unsafe fn release(&mut self) {
        free_slice(self.data, self.length);
        *self = Self::EMPTY;
    }

    pub(crate) fn new_owned(values: Vec<i32>) -> *mut ZwIntList {
        let length = values.len();
        alloc_box(Self {
            data: alloc_slice(values.into_boxed_slice()),
            length,
        })
    }
}

/// Creates an empty integer list. Free it with `zw_int_list_free`.
#[no_mangle]
pub extern "C" fn zw_int_list_empty() -> *mut ZwIntList {
    alloc_box(ZwIntList::EMPTY)
}

/// Resizes the list to `size` zeros, releasing its previous contents first.
///
/// # Panics
///
/// This function will panic if called with a null pointer.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid and that its contents
/// were allocated by this library.
#[no_mangle]
pub unsafe extern "C" fn zw_int_list_init(list: *mut ZwIntList, size: usize) {
    assert!(!list.is_null(), "called `zw_int_list_init` with null pointer");
    let list = &mut *list;
    list.release();
    list.data = alloc_slice(vec![0i32; size].into_boxed_slice());
    list.length = size;
}

/// Returns the integer at `pos`.
///
/// # Panics
///
/// This function will panic if called with a null pointer or if `pos` is
/// out of bounds.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is valid.
#[no_mangle]
pub unsafe extern "C" fn zw_int_list_at(list: *const ZwIntList, pos: usize) -> i32 {
    assert!(!list.is_null(), "called `zw_int_list_at` with null pointer");
    let list = &*list;
    assert!(
        pos < list.length,
        "called `zw_int_list_at` with index out of bounds: the len is {} but the index is {}",
        list.length,
        pos
    );
    *list.data.add(pos)
}

/// Frees an integer list returned by this library, including its contents.
///
/// # Safety
///
/// This function is unsafe because it dereferences a raw pointer.
/// The caller must ensure that the pointer is null or was returned by this
/// library and has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn zw_int_list_free(list: *mut ZwIntList) {
    if list.is_null() {
        return;
    }
    let mut list = free_box(list);
    list.release();
}

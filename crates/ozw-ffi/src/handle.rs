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

//! # Opaque Handles and Value Identifiers
//!
//! ## Overview
//!
//! * `ZwManager` and `ZwOptions` are opaque types. A pointer to one is a
//!   process-unique generation token issued by `zw_manager_create` /
//!   `zw_options_create`. It is never dereferenced; every call resolves it
//!   against the live singleton and rejects it once that singleton is gone.
//! * `ZwValueId` is the value identifier split into its home id and the two
//!   halves of the 64-bit id. It is passed by value and rebuilt into the
//!   native identifier on every call.
//!
//! ## Exported Functions
//!
//! * `zw_value_id_new`
//! * `zw_value_id_from_parts`
//! * `zw_value_id_get_id`
//! * `zw_value_id_node_id`
//! * `zw_value_id_genre`
//! * `zw_value_id_command_class_id`
//! * `zw_value_id_instance`
//! * `zw_value_id_index`
//! * `zw_value_id_type`
//! * `zw_value_id_get_genre_as_string`
//! * `zw_value_id_get_type_as_string`

use ozw_core::value_id::{ValueGenre, ValueId, ValueType};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Opaque handle to the manager singleton.
#[repr(C)]
pub struct ZwManager {
    _private: [u8; 0],
}

/// Opaque handle to the options singleton.
#[repr(C)]
pub struct ZwOptions {
    _private: [u8; 0],
}

static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(1);

/// Issues a token that has never been handed out before. Never zero.
pub(crate) fn next_token() -> usize {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

mirror_enum! {
    /// Audience of a value.
    pub enum ZwValueGenre mirrors ValueGenre {
        Basic = 0,
        User = 1,
        Config = 2,
        System = 3,
        Count = 4,
    }
}

mirror_enum! {
    /// Declared type of a value.
    pub enum ZwValueType mirrors ValueType {
        Bool = 0,
        Byte = 1,
        Decimal = 2,
        Int = 3,
        List = 4,
        Schedule = 5,
        Short = 6,
        String = 7,
        Button = 8,
        Raw = 9,
    }
}

/// A value identifier as it crosses the boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ZwValueId {
    pub home_id: u32,
    pub id_low: u32,
    pub id_high: u32,
}

impl From<ZwValueId> for ValueId {
    #[inline]
    fn from(id: ZwValueId) -> Self {
        ValueId::from_parts(id.home_id, id.id_low, id.id_high)
    }
}

impl From<&ValueId> for ZwValueId {
    #[inline]
    fn from(id: &ValueId) -> Self {
        let (home_id, id_low, id_high) = id.parts();
        Self {
            home_id,
            id_low,
            id_high,
        }
    }
}

impl From<ValueId> for ZwValueId {
    #[inline]
    fn from(id: ValueId) -> Self {
        Self::from(&id)
    }
}

/// Packs the individual fields into a value identifier.
///
/// Returns the all-zero identifier, which names no value, if `genre` or
/// `value_type` is out of range.
#[no_mangle]
pub extern "C" fn zw_value_id_new(
    home_id: u32,
    node_id: u8,
    genre: i32,
    command_class_id: u8,
    instance: u8,
    index: u8,
    value_type: i32,
) -> ZwValueId {
    let (Some(genre), Some(value_type)) = (
        ZwValueGenre::from_raw(genre, "zw_value_id_new"),
        ZwValueType::from_raw(value_type, "zw_value_id_new"),
    ) else {
        return ZwValueId::default();
    };
    ValueId::new(
        home_id,
        node_id,
        genre.into(),
        command_class_id,
        instance,
        index,
        value_type.into(),
    )
    .into()
}

/// Builds a value identifier from its home id and id halves.
#[no_mangle]
pub extern "C" fn zw_value_id_from_parts(home_id: u32, id_low: u32, id_high: u32) -> ZwValueId {
    ZwValueId {
        home_id,
        id_low,
        id_high,
    }
}

/// The full 64-bit id.
#[no_mangle]
pub extern "C" fn zw_value_id_get_id(id: ZwValueId) -> u64 {
    ValueId::from(id).id()
}

#[no_mangle]
pub extern "C" fn zw_value_id_node_id(id: ZwValueId) -> u8 {
    ValueId::from(id).node_id()
}

#[no_mangle]
pub extern "C" fn zw_value_id_genre(id: ZwValueId) -> ZwValueGenre {
    ValueId::from(id).genre().into()
}

#[no_mangle]
pub extern "C" fn zw_value_id_command_class_id(id: ZwValueId) -> u8 {
    ValueId::from(id).command_class_id()
}

#[no_mangle]
pub extern "C" fn zw_value_id_instance(id: ZwValueId) -> u8 {
    ValueId::from(id).instance()
}

#[no_mangle]
pub extern "C" fn zw_value_id_index(id: ZwValueId) -> u8 {
    ValueId::from(id).index()
}

/// The raw type bits of the identifier.
///
/// Values `0..=9` are `ZwValueType` discriminants. The type slot is four bits
/// wide, so an identifier not built by the library may carry a larger value;
/// it is returned unchanged rather than converted to an invalid enum.
#[no_mangle]
pub extern "C" fn zw_value_id_type(id: ZwValueId) -> u8 {
    ValueId::from(id).type_bits()
}

/// Name of the genre as a static C string.
#[no_mangle]
pub extern "C" fn zw_value_id_get_genre_as_string(id: ZwValueId) -> *const libc::c_char {
    zw_value_id_genre(id).c_name()
}

/// Name of the type as a static C string, or `"Unknown"` for type bits that
/// do not name a type.
#[no_mangle]
pub extern "C" fn zw_value_id_get_type_as_string(id: ZwValueId) -> *const libc::c_char {
    match ValueId::from(id).value_type() {
        Some(ty) => ZwValueType::from(ty).c_name(),
        None => crate::UNKNOWN.as_ptr().cast(),
    }
}

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

//! Value identifiers.
//!
//! A `ValueId` names one value on one node of one Z-Wave network. It is a
//! 32-bit home id plus a packed 64-bit id whose bit layout carries the node
//! id, genre, command class, instance, index and value type:
//!
//! | word | bits  | field          |
//! |------|-------|----------------|
//! | low  | 24–31 | node id        |
//! | low  | 22–23 | genre          |
//! | low  | 14–21 | command class  |
//! | low  | 4–11  | index          |
//! | low  | 0–3   | value type     |
//! | high | 24–31 | instance       |

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::Display;

const NODE_MASK: u32 = 0xff00_0000;
const NODE_SHIFT: u32 = 24;
const GENRE_MASK: u32 = 0x00c0_0000;
const GENRE_SHIFT: u32 = 22;
const COMMAND_CLASS_MASK: u32 = 0x003f_c000;
const COMMAND_CLASS_SHIFT: u32 = 14;
const INDEX_MASK: u32 = 0x0000_0ff0;
const INDEX_SHIFT: u32 = 4;
const TYPE_MASK: u32 = 0x0000_000f;
const INSTANCE_MASK: u32 = 0xff00_0000;
const INSTANCE_SHIFT: u32 = 24;

/// Classification of a value by its intended audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ValueGenre {
    Basic = 0,
    User = 1,
    Config = 2,
    System = 3,
    Count = 4,
}

impl ValueGenre {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::User => "User",
            Self::Config => "Config",
            Self::System => "System",
            Self::Count => "Count",
        }
    }
}

impl Display for ValueGenre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The data type held by a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ValueType {
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

impl ValueType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Byte => "Byte",
            Self::Decimal => "Decimal",
            Self::Int => "Int",
            Self::List => "List",
            Self::Schedule => "Schedule",
            Self::Short => "Short",
            Self::String => "String",
            Self::Button => "Button",
            Self::Raw => "Raw",
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier of a single value within a Z-Wave network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId {
    home_id: u32,
    id: u64,
}

impl ValueId {
    /// Packs the individual fields into a `ValueId`.
    ///
    /// Fields wider than their slot are truncated to the slot width.
    pub fn new(
        home_id: u32,
        node_id: u8,
        genre: ValueGenre,
        command_class_id: u8,
        instance: u8,
        index: u8,
        value_type: ValueType,
    ) -> Self {
        let low = ((node_id as u32) << NODE_SHIFT)
            | (((u8::from(genre) as u32) << GENRE_SHIFT) & GENRE_MASK)
            | ((command_class_id as u32) << COMMAND_CLASS_SHIFT)
            | ((index as u32) << INDEX_SHIFT)
            | (u8::from(value_type) as u32 & TYPE_MASK);
        let high = (instance as u32) << INSTANCE_SHIFT;
        Self::from_parts(home_id, low, high)
    }

    /// Rebuilds a `ValueId` from its home id and the two 32-bit id halves.
    #[inline]
    pub const fn from_parts(home_id: u32, id_low: u32, id_high: u32) -> Self {
        Self {
            home_id,
            id: ((id_high as u64) << 32) | id_low as u64,
        }
    }

    /// Returns `(home_id, id_low, id_high)`.
    #[inline]
    pub const fn parts(&self) -> (u32, u32, u32) {
        (self.home_id, self.id_low(), self.id_high())
    }

    #[inline]
    pub const fn home_id(&self) -> u32 {
        self.home_id
    }

    /// The packed 64-bit id without the home id.
    #[inline]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub const fn id_low(&self) -> u32 {
        self.id as u32
    }

    #[inline]
    pub const fn id_high(&self) -> u32 {
        (self.id >> 32) as u32
    }

    #[inline]
    pub const fn node_id(&self) -> u8 {
        ((self.id_low() & NODE_MASK) >> NODE_SHIFT) as u8
    }

    /// The genre of the value. The two-bit slot always decodes.
    #[inline]
    pub fn genre(&self) -> ValueGenre {
        let raw = ((self.id_low() & GENRE_MASK) >> GENRE_SHIFT) as u8;
        ValueGenre::try_from(raw).unwrap_or(ValueGenre::Basic)
    }

    #[inline]
    pub const fn command_class_id(&self) -> u8 {
        ((self.id_low() & COMMAND_CLASS_MASK) >> COMMAND_CLASS_SHIFT) as u8
    }

    #[inline]
    pub const fn instance(&self) -> u8 {
        ((self.id_high() & INSTANCE_MASK) >> INSTANCE_SHIFT) as u8
    }

    #[inline]
    pub const fn index(&self) -> u8 {
        ((self.id_low() & INDEX_MASK) >> INDEX_SHIFT) as u8
    }

    /// The raw four-bit type slot.
    #[inline]
    pub const fn type_bits(&self) -> u8 {
        (self.id_low() & TYPE_MASK) as u8
    }

    /// The value type, or `None` if the type slot holds an unknown code.
    #[inline]
    pub fn value_type(&self) -> Option<ValueType> {
        ValueType::try_from(self.type_bits()).ok()
    }
}

impl Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ValueId(home: 0x{:08x}, node: {}, cc: 0x{:02x}, instance: {}, index: {}, genre: {}, type: {})",
            self.home_id,
            self.node_id(),
            self.command_class_id(),
            self.instance(),
            self.index(),
            self.genre(),
            self.value_type()
                .map(|t| t.as_str())
                .unwrap_or("Unknown")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_packs_every_field() {
        let id = ValueId::new(0xdead_beef, 7, ValueGenre::User, 0x25, 2, 0, ValueType::Bool);
        assert_eq!(id.home_id(), 0xdead_beef);
        assert_eq!(id.node_id(), 7);
        assert_eq!(id.genre(), ValueGenre::User);
        assert_eq!(id.command_class_id(), 0x25);
        assert_eq!(id.instance(), 2);
        assert_eq!(id.index(), 0);
        assert_eq!(id.value_type(), Some(ValueType::Bool));
    }

    #[test]
    fn test_layout_matches_native_bits() {
        let id = ValueId::new(1, 0x03, ValueGenre::Config, 0x31, 1, 0x0a, ValueType::Decimal);
        let (_, low, high) = id.parts();
        assert_eq!(low, 0x0300_0000 | (2 << 22) | (0x31 << 14) | (0x0a << 4) | 2);
        assert_eq!(high, 0x0100_0000);
    }

    #[test]
    fn test_unknown_type_bits_decode_to_none() {
        let id = ValueId::from_parts(1, 0x0000_000f, 0);
        assert_eq!(id.type_bits(), 0x0f);
        assert_eq!(id.value_type(), None);
    }

    #[test]
    fn test_display_mentions_node_and_type() {
        let id = ValueId::new(0x0102_0304, 4, ValueGenre::Basic, 0x20, 1, 0, ValueType::Byte);
        let text = id.to_string();
        assert!(text.contains("home: 0x01020304"));
        assert!(text.contains("node: 4"));
        assert!(text.contains("type: Byte"));
    }

    proptest! {
        #[test]
        fn prop_parts_round_trip(home in any::<u32>(), low in any::<u32>(), high in any::<u32>()) {
            let id = ValueId::from_parts(home, low, high);
            prop_assert_eq!(id.parts(), (home, low, high));
        }

        #[test]
        fn prop_fields_round_trip(
            home in any::<u32>(),
            node in any::<u8>(),
            cc in any::<u8>(),
            instance in any::<u8>(),
            index in any::<u8>(),
            genre in 0u8..4,
            ty in 0u8..10,
        ) {
            let genre = ValueGenre::try_from(genre).unwrap();
            let ty = ValueType::try_from(ty).unwrap();
            let id = ValueId::new(home, node, genre, cc, instance, index, ty);
            prop_assert_eq!(id.node_id(), node);
            prop_assert_eq!(id.command_class_id(), cc);
            prop_assert_eq!(id.instance(), instance);
            prop_assert_eq!(id.index(), index);
            prop_assert_eq!(id.genre(), genre);
            prop_assert_eq!(id.value_type(), Some(ty));
        }
    }
}

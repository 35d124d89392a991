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

//! Virtual nodes.

use crate::value::ValueRecord;
use fixedbitset::FixedBitSet;
use ozw_core::manager::NodeClassInfo;
use ozw_core::value_id::ValueId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Highest node id a Z-Wave network can address.
pub const MAX_NODE_ID: usize = 232;

/// An association group of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: String,
    pub max_associations: u8,
    pub associations: SmallVec<[u8; 8]>,
}

impl Group {
    pub fn new(label: &str, max_associations: u8) -> Self {
        Self {
            label: label.to_string(),
            max_associations,
            associations: SmallVec::new(),
        }
    }

    pub fn with(mut self, target: u8) -> Self {
        self.associations.push(target);
        self
    }

    /// Adds `target`. Returns `false` if it is present or the group is full.
    pub fn add(&mut self, target: u8) -> bool {
        if self.associations.contains(&target)
            || self.associations.len() >= self.max_associations as usize
        {
            return false;
        }
        self.associations.push(target);
        true
    }

    pub fn remove(&mut self, target: u8) -> bool {
        match self.associations.iter().position(|&t| t == target) {
            Some(pos) => {
                self.associations.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// Static protocol and identification data of a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeInfo {
    pub basic: u8,
    pub generic: u8,
    pub specific: u8,
    pub type_name: String,
    pub manufacturer_id: String,
    pub product_type: String,
    pub product_id: String,
    pub manufacturer_name: String,
    pub product_name: String,
    pub listening: bool,
    pub frequent_listening: bool,
    pub beaming: bool,
    pub routing: bool,
    pub security: u8,
    pub max_baud_rate: u32,
    pub version: u8,
    pub zwave_plus: bool,
    pub device_type: u16,
    pub device_type_name: String,
    pub role: u8,
    pub role_name: String,
    pub plus_type: u8,
    pub plus_type_name: String,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub node_id: u8,
    pub info: NodeInfo,
    pub name: String,
    pub location: String,
    pub awake: bool,
    pub failed: bool,
    pub info_received: bool,
    pub query_stage: &'static str,
    pub values: BTreeMap<u64, ValueRecord>,
    pub groups: BTreeMap<u8, Group>,
    pub classes: FxHashMap<u8, NodeClassInfo>,
    pub neighbors: FixedBitSet,
    pub buttons: SmallVec<[u8; 4]>,
}

impl Node {
    pub fn new(node_id: u8, info: NodeInfo) -> Self {
        let awake = info.listening;
        Self {
            node_id,
            info,
            name: String::new(),
            location: String::new(),
            awake,
            failed: false,
            info_received: true,
            query_stage: "Complete",
            values: BTreeMap::new(),
            groups: BTreeMap::new(),
            classes: FxHashMap::default(),
            neighbors: FixedBitSet::with_capacity(MAX_NODE_ID + 1),
            buttons: SmallVec::new(),
        }
    }

    pub fn add_value(&mut self, record: ValueRecord) {
        self.values.insert(record.id.id(), record);
    }

    pub fn add_class(&mut self, command_class_id: u8, name: &str, version: u8) {
        self.classes.insert(
            command_class_id,
            NodeClassInfo {
                name: name.to_string(),
                version,
            },
        );
    }

    pub fn value(&self, id: &ValueId) -> Option<&ValueRecord> {
        self.values.get(&id.id())
    }

    pub fn value_mut(&mut self, id: &ValueId) -> Option<&mut ValueRecord> {
        self.values.get_mut(&id.id())
    }

    /// The first value of `command_class_id` at `index`, across instances.
    pub fn find_value_mut(&mut self, command_class_id: u8, index: u8) -> Option<&mut ValueRecord> {
        self.values
            .values_mut()
            .find(|v| v.id.command_class_id() == command_class_id && v.id.index() == index)
    }

    pub fn neighbor_ids(&self) -> Vec<u8> {
        self.neighbors.ones().map(|n| n as u8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_add_respects_limit_and_duplicates() {
        let mut g = Group::new("Lifeline", 2).with(1);
        assert!(!g.add(1));
        assert!(g.add(5));
        assert!(!g.add(6));
        assert_eq!(g.associations.as_slice(), &[1, 5]);
        assert!(g.remove(1));
        assert!(!g.remove(1));
    }

    #[test]
    fn test_neighbors_are_listed_in_order() {
        let mut node = Node::new(2, NodeInfo::default());
        node.neighbors.insert(7);
        node.neighbors.insert(1);
        assert_eq!(node.neighbor_ids(), vec![1, 7]);
    }
}

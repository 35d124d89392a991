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

//! # Association Groups
//!
//! Groups are numbered from 1. Associations are returned as an owned
//! `ZwBytes` of target node ids, null on failure.
//!
//! ## Exported Functions
//!
//! * `zw_manager_get_num_groups`
//! * `zw_manager_get_associations`
//! * `zw_manager_get_max_associations`
//! * `zw_manager_get_group_label`
//! * `zw_manager_add_association`
//! * `zw_manager_remove_association`

use crate::buffer::ZwBytes;
use crate::context;
use crate::handle::ZwManager;
use std::ptr::null_mut;

forward! {
    fn get_num_groups(home_id: u32, node_id: u8) -> u8 => get_num_groups;
    fn get_max_associations(home_id: u32, node_id: u8, group_idx: u8) -> u8 => get_max_associations;
    fn add_association(home_id: u32, node_id: u8, group_idx: u8, target_node_id: u8) => add_association;
    fn remove_association(home_id: u32, node_id: u8, group_idx: u8, target_node_id: u8) => remove_association;
}

forward_string! {
    fn get_group_label(home_id: u32, node_id: u8, group_idx: u8) => get_group_label;
}

/// Node ids associated with the group. Free the result with
/// `zw_bytes_free`. Returns null on failure.
#[no_mangle]
pub extern "C" fn zw_manager_get_associations(
    manager: *const ZwManager,
    home_id: u32,
    node_id: u8,
    group_idx: u8,
) -> *mut ZwBytes {
    context::call(manager, "zw_manager_get_associations", |m| {
        m.get_associations(home_id, node_id, group_idx)
    })
    .map_or(null_mut(), ZwBytes::new_owned)
}

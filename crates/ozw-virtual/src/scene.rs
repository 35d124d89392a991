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

//! Scenes: named sets of value assignments applied together.

use ozw_core::exception::{NativeResult, OzwException};
use ozw_core::manager::{Value, ValueKind};
use ozw_core::value_id::ValueId;
use std::collections::BTreeMap;

/// Highest scene id.
pub const MAX_SCENE_ID: u8 = 255;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub label: String,
    pub values: Vec<(ValueId, Value)>,
}

impl Scene {
    fn position(&self, id: &ValueId) -> Option<usize> {
        self.values.iter().position(|(v, _)| v == id)
    }

    /// Adds an assignment. Returns `false` if the value is already part of
    /// the scene.
    pub fn add(&mut self, id: ValueId, value: Value) -> NativeResult<bool> {
        check_kind(&id, value.kind())?;
        if self.position(&id).is_some() {
            return Ok(false);
        }
        self.values.push((id, value));
        Ok(true)
    }

    pub fn set(&mut self, id: &ValueId, value: Value) -> NativeResult<bool> {
        check_kind(id, value.kind())?;
        match self.position(id) {
            Some(pos) => {
                self.values[pos].1 = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove(&mut self, id: &ValueId) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.values.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Reads a stored assignment as `kind`.
    pub fn get(&self, id: &ValueId, kind: ValueKind) -> NativeResult<Option<Value>> {
        check_kind(id, kind)?;
        let Some(pos) = self.position(id) else {
            return Ok(None);
        };
        let stored = &self.values[pos].1;
        if stored.kind() == kind {
            return Ok(Some(stored.clone()));
        }
        let converted = match (stored, kind) {
            (Value::Bool(b), ValueKind::String) => Some(Value::String(if *b { "True" } else { "False" }.into())),
            (Value::Byte(v), ValueKind::String) => Some(Value::String(v.to_string())),
            (Value::Float(v), ValueKind::String) => Some(Value::String(v.to_string())),
            (Value::Int(v), ValueKind::String) => Some(Value::String(v.to_string())),
            (Value::Short(v), ValueKind::String) => Some(Value::String(v.to_string())),
            (Value::ListSelection(s), ValueKind::String) => Some(Value::String(s.clone())),
            (Value::ListValue(v), ValueKind::String) => Some(Value::String(v.to_string())),
            _ => None,
        };
        Ok(converted)
    }
}

fn check_kind(id: &ValueId, kind: ValueKind) -> NativeResult<()> {
    match kind.required_type() {
        Some(required) if id.value_type() != Some(required) => Err(OzwException::cannot_convert(format!(
            "ValueID passed to scene is not a {} Value",
            required
        ))),
        _ => Ok(()),
    }
}

/// Returns the lowest unused scene id, or `0` if every id is taken.
pub fn next_free_id(scenes: &BTreeMap<u8, Scene>) -> u8 {
    (1..=MAX_SCENE_ID)
        .find(|id| !scenes.contains_key(id))
        .unwrap_or(0)
}

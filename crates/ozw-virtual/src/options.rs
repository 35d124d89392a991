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

//! The virtual options store and its process-wide instance.

use ozw_core::options::{OptionType, Options};
use parking_lot::{const_mutex, Mutex};
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum OptionValue {
    Bool(bool),
    Int(i32),
    String { value: String, append: bool },
}

impl OptionValue {
    fn option_type(&self) -> OptionType {
        match self {
            Self::Bool(_) => OptionType::Bool,
            Self::Int(_) => OptionType::Int,
            Self::String { .. } => OptionType::String,
        }
    }

    /// Applies a value given on the command line. Returns `false` if it does
    /// not parse as the option's type.
    fn apply(&mut self, text: &str) -> bool {
        match self {
            Self::Bool(b) => match text.to_ascii_lowercase().as_str() {
                "" | "true" | "1" => *b = true,
                "false" | "0" => *b = false,
                _ => return false,
            },
            Self::Int(i) => match text.parse() {
                Ok(v) => *i = v,
                Err(_) => return false,
            },
            Self::String { value, append } => {
                if *append && !value.is_empty() {
                    value.push(',');
                    value.push_str(text);
                } else {
                    *value = text.to_string();
                }
            }
        }
        true
    }
}

#[derive(Debug, Default)]
struct OptionsState {
    locked: bool,
    entries: FxHashMap<String, OptionValue>,
}

/// The options store of the virtual library.
///
/// Names are case insensitive.
#[derive(Debug)]
pub struct VirtualOptions {
    command_line: String,
    state: Mutex<OptionsState>,
}

impl VirtualOptions {
    /// Creates a store with the library's built-in options registered.
    pub fn new(config_path: &str, user_path: &str, command_line: &str) -> Self {
        let options = Self {
            command_line: command_line.to_string(),
            state: Mutex::new(OptionsState::default()),
        };
        options.add_option_string("ConfigPath", config_path, false);
        options.add_option_string("UserPath", user_path, false);
        options.add_option_bool("Logging", true);
        options.add_option_string("LogFileName", "OZW_Log.txt", false);
        options.add_option_bool("AppendLogFile", false);
        options.add_option_bool("ConsoleOutput", true);
        options.add_option_int("SaveLogLevel", 8);
        options.add_option_int("QueueLogLevel", 9);
        options.add_option_int("DumpTriggerLevel", 0);
        options.add_option_bool("Associate", true);
        options.add_option_string("Exclude", "", true);
        options.add_option_string("Include", "", true);
        options.add_option_bool("NotifyTransactions", false);
        options.add_option_string("Interface", "", true);
        options.add_option_bool("SaveConfiguration", true);
        options.add_option_int("DriverMaxAttempts", 0);
        options.add_option_int("PollInterval", 30_000);
        options.add_option_bool("IntervalBetweenPolls", false);
        options.add_option_bool("SuppressValueRefresh", false);
        options.add_option_bool("PerformReturnRoutes", true);
        options.add_option_string("NetworkKey", "", false);
        options.add_option_int("RetryTimeout", 40_000);
        options.add_option_bool("EnableSIS", true);
        options.add_option_bool("AssumeAwake", true);
        options
    }

    fn add(&self, name: &str, value: OptionValue) -> bool {
        let mut state = self.state.lock();
        if state.locked {
            tracing::warn!(option = name, "options are locked, cannot add option");
            return false;
        }
        state.entries.insert(name.to_ascii_lowercase(), value);
        true
    }

    fn get(&self, name: &str) -> Option<OptionValue> {
        self.state.lock().entries.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Applies `--name value` pairs from the command line.
    fn parse_command_line(state: &mut OptionsState, command_line: &str) {
        let mut tokens = command_line.split_whitespace().peekable();
        while let Some(token) = tokens.next() {
            let Some(name) = token.strip_prefix("--") else {
                continue;
            };
            let mut words = Vec::new();
            while let Some(next) = tokens.peek() {
                if next.starts_with("--") {
                    break;
                }
                words.push(*next);
                tokens.next();
            }
            let text = words.join(" ");
            match state.entries.get_mut(&name.to_ascii_lowercase()) {
                Some(value) => {
                    if !value.apply(&text) {
                        tracing::warn!(option = name, value = %text, "ignoring unparsable option value");
                    }
                }
                None => tracing::warn!(option = name, "ignoring unknown option on command line"),
            }
        }
    }
}

impl Options for VirtualOptions {
    fn lock(&self) -> bool {
        let mut state = self.state.lock();
        if state.locked {
            tracing::warn!("options are already locked");
            return false;
        }
        Self::parse_command_line(&mut state, &self.command_line);
        state.locked = true;
        true
    }

    fn are_locked(&self) -> bool {
        self.state.lock().locked
    }

    fn add_option_bool(&self, name: &str, default: bool) -> bool {
        self.add(name, OptionValue::Bool(default))
    }

    fn add_option_int(&self, name: &str, default: i32) -> bool {
        self.add(name, OptionValue::Int(default))
    }

    fn add_option_string(&self, name: &str, default: &str, append: bool) -> bool {
        self.add(
            name,
            OptionValue::String {
                value: default.to_string(),
                append,
            },
        )
    }

    fn get_option_as_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            OptionValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    fn get_option_as_int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            OptionValue::Int(i) => Some(i),
            _ => None,
        }
    }

    fn get_option_as_string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            OptionValue::String { value, .. } => Some(value),
            _ => None,
        }
    }

    fn get_option_type(&self, name: &str) -> OptionType {
        self.get(name)
            .map(|v| v.option_type())
            .unwrap_or(OptionType::Invalid)
    }
}

static INSTANCE: Mutex<Option<Arc<VirtualOptions>>> = const_mutex(None);

/// Creates the process-wide options, or returns the existing instance.
pub fn create(config_path: &str, user_path: &str, command_line: &str) -> Arc<VirtualOptions> {
    let mut instance = INSTANCE.lock();
    if let Some(existing) = instance.as_ref() {
        return Arc::clone(existing);
    }
    let options = Arc::new(VirtualOptions::new(config_path, user_path, command_line));
    *instance = Some(Arc::clone(&options));
    tracing::info!(config_path, user_path, "options created");
    options
}

pub fn get() -> Option<Arc<VirtualOptions>> {
    INSTANCE.lock().clone()
}

/// Destroys the process-wide options. Fails while a manager exists.
pub fn destroy() -> bool {
    if crate::manager::get().is_some() {
        tracing::warn!("cannot destroy options while the manager exists");
        return false;
    }
    INSTANCE.lock().take().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_options_are_registered() {
        let opts = VirtualOptions::new("/etc/ozw", "/tmp", "");
        assert_eq!(opts.get_option_as_string("ConfigPath").as_deref(), Some("/etc/ozw"));
        assert_eq!(opts.get_option_as_string("userpath").as_deref(), Some("/tmp"));
        assert_eq!(opts.get_option_type("PollInterval"), OptionType::Int);
        assert_eq!(opts.get_option_type("Nope"), OptionType::Invalid);
    }

    #[test]
    fn test_add_after_lock_fails() {
        let opts = VirtualOptions::new("", "", "");
        assert!(opts.add_option_int("Custom", 3));
        assert!(opts.lock());
        assert!(opts.are_locked());
        assert!(!opts.add_option_bool("Late", true));
        assert!(!opts.lock());
        assert_eq!(opts.get_option_as_int("Custom"), Some(3));
    }

    #[test]
    fn test_lock_applies_command_line() {
        let opts = VirtualOptions::new("", "", "--SaveLogLevel 4 --Logging false --Exclude 2 --Exclude 3 --NetworkKey a b");
        opts.add_option_string("Exclude", "1", true);
        assert!(opts.lock());
        assert_eq!(opts.get_option_as_int("SaveLogLevel"), Some(4));
        assert_eq!(opts.get_option_as_bool("Logging"), Some(false));
        assert_eq!(opts.get_option_as_string("Exclude").as_deref(), Some("1,2,3"));
        assert_eq!(opts.get_option_as_string("NetworkKey").as_deref(), Some("a b"));
    }

    #[test]
    fn test_wrong_type_getter_is_none() {
        let opts = VirtualOptions::new("", "", "");
        assert_eq!(opts.get_option_as_bool("PollInterval"), None);
    }
}

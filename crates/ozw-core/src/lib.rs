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

//! # OZW Core
//!
//! Native-side types of the OpenZWave library and the trait seam the C
//! bindings call through.
//!
//! ## Modules
//!
//! - `value_id`: The packed `ValueId` with its genre and type enums.
//! - `notification`: Notification kinds, codes, controller states and the
//!   `Notification` record handed to watchers.
//! - `exception`: The native exception taxonomy (`OzwException`).
//! - `log_level`: The native log verbosity scale.
//! - `options`: The `Options` store trait.
//! - `manager`: The `Manager` trait and the data it exchanges.
//! - `backend`: Singleton lifecycle and version entry points.

pub mod backend;
pub mod exception;
pub mod log_level;
pub mod manager;
pub mod notification;
pub mod options;
pub mod value_id;

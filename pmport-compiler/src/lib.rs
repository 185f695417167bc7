// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generator porting PocketMine-MP packet classes to Go packet
//! definitions.

use std::path::PathBuf;

pub mod ast;
pub mod backends;
pub mod brackets;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod extractor;
pub mod ids;
pub mod parser;
#[cfg(test)]
pub mod test_utils;

/// Fatal errors aborting a generator run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot access {}: {err}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Errors reported against the identifier declarations.
    #[error("invalid identifier declarations: {0}")]
    Diagnostics(diagnostics::Diagnostics),
    #[error("formatter `{program}` failed: {message}")]
    Formatter { program: String, message: String },
}

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

use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files;
use codespan_reporting::term;
use codespan_reporting::term::termcolor;
use std::fmt;

use crate::ast::{FileId, SourceDatabase};

/// List of unique errors reported as diagnostics.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DuplicateIdentifier = 1,
    InconsistentAlias = 2,
    EmptyIdTable = 3,
    MissingPacketClass = 4,
    UnbalancedBrackets = 5,
    MissingProcedureBody = 6,
    AsymmetricProcedures = 7,
    UnreadableSource = 8,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "E{}", *self as u16)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        format!("{}", code)
    }
}

/// Aggregate diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic<FileId>>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn push(&mut self, diagnostic: Diagnostic<FileId>) {
        self.diagnostics.push(diagnostic)
    }

    pub fn err_or<T>(self, value: T) -> Result<T, Diagnostics> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn emit(
        &self,
        sources: &SourceDatabase,
        writer: &mut dyn termcolor::WriteColor,
    ) -> Result<(), files::Error> {
        let config = term::Config::default();
        for d in self.diagnostics.iter() {
            term::emit(writer, &config, sources, d)?;
        }
        Ok(())
    }
}

impl From<Diagnostic<FileId>> for Diagnostics {
    fn from(diagnostic: Diagnostic<FileId>) -> Self {
        Diagnostics { diagnostics: vec![diagnostic] }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let messages: Vec<_> = self.diagnostics.iter().map(|d| d.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Render a diagnostic as plain text, with source snippets.
///
/// Falls back to the bare message if the labels do not resolve in the
/// source database.
pub fn render(sources: &SourceDatabase, diagnostic: &Diagnostic<FileId>) -> String {
    let mut writer = termcolor::NoColor::new(Vec::new());
    let config = term::Config::default();
    match term::emit(&mut writer, &config, sources, diagnostic) {
        Ok(()) => String::from_utf8_lossy(&writer.into_inner()).into_owned(),
        Err(_) => diagnostic.message.clone(),
    }
}

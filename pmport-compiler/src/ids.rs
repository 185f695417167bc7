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

//! Canonical identifier table.
//!
//! Several declarations may share a numeric value. The first one seen,
//! in declaration order, owns the value; later ones become aliases of
//! it.

use codespan_reporting::diagnostic::Diagnostic;
use serde::Serialize;
use std::collections::HashMap;

use crate::ast::{ConstEntry, FileId, SourceRange};
use crate::diagnostics::{Diagnostics, ErrorCode};
use crate::parser;

/// Secondary name bound to a value owned by a canonical constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub name: String,
    pub canonical: String,
    #[serde(skip_serializing)]
    pub loc: SourceRange,
}

/// One slot of the contiguous enumeration of the canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    Named(&'a ConstEntry),
    /// Unused value between two declared ones.
    Placeholder(i64),
}

/// Canonical and alias tables, immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct IdTable {
    /// Canonical constants, in declaration order.
    canonical: Vec<ConstEntry>,
    /// Aliases, in declaration order.
    aliases: Vec<Alias>,
    #[serde(skip_serializing)]
    values: HashMap<String, i64>,
    #[serde(skip_serializing)]
    by_value: HashMap<i64, usize>,
}

/// Line of a declaration file with its byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub start: usize,
    pub text: String,
}

/// Convert `UPPER_SNAKE` names to `PascalCase`.
pub fn upper_to_pascal(name: &str) -> String {
    name.split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Blank out `//`, `#` and `/* */` comments, preserving byte offsets
/// and line breaks.
pub fn strip_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let rest = &bytes[index..];
        let end = if rest.starts_with(b"//") || rest.starts_with(b"#") {
            rest.iter().position(|b| *b == b'\n').map_or(bytes.len(), |n| index + n)
        } else if rest.starts_with(b"/*") {
            source[index + 2..].find("*/").map_or(bytes.len(), |n| index + 2 + n + 2)
        } else {
            out.push(bytes[index]);
            index += 1;
            continue;
        };
        out.extend(bytes[index..end].iter().map(|b| if *b == b'\n' { b'\n' } else { b' ' }));
        index = end;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Split a declaration file into trimmed, comment free lines.
pub fn declaration_lines(source: &str) -> Vec<Line> {
    let stripped = strip_comments(source);
    let mut lines = vec![];
    let mut start = 0;
    for line in stripped.split('\n') {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let offset = line.len() - line.trim_start().len();
            lines.push(Line { start: start + offset, text: trimmed.to_owned() });
        }
        start += line.len() + 1;
    }
    lines
}

#[derive(Debug, Default, Clone)]
pub struct IdTableBuilder {
    suffix: Option<String>,
}

impl IdTableBuilder {
    pub fn new() -> IdTableBuilder {
        IdTableBuilder::default()
    }

    /// Only keep declarations whose name ends with `suffix`, and remove
    /// it from the name before the case conversion.
    pub fn with_suffix(suffix: &str) -> IdTableBuilder {
        IdTableBuilder { suffix: (!suffix.is_empty()).then(|| suffix.to_owned()) }
    }

    fn declared_name<'a>(&self, raw: &'a str) -> Option<&'a str> {
        match &self.suffix {
            Some(suffix) => raw.strip_suffix(suffix.as_str()).filter(|stem| !stem.is_empty()),
            None => Some(raw),
        }
    }

    /// Build the tables from the declaration lines of `file`.
    ///
    /// Lines that are not constant declarations are ignored. The
    /// declaration order is significant: the first name declared for a
    /// value is its canonical name.
    pub fn build(&self, file: FileId, lines: &[Line]) -> Result<IdTable, Diagnostics> {
        let mut diagnostics = Diagnostics::default();
        let mut table = IdTable {
            canonical: vec![],
            aliases: vec![],
            values: HashMap::new(),
            by_value: HashMap::new(),
        };
        let mut locs: HashMap<String, SourceRange> = HashMap::new();

        for line in lines {
            let Some((raw, value)) = parser::parse_constant(&line.text) else {
                continue;
            };
            let Some(stem) = self.declared_name(&raw) else {
                continue;
            };
            let name = upper_to_pascal(stem);
            let loc = SourceRange::new(file, line.start, line.start + line.text.len());

            if let Some(prev) = table.values.get(&name) {
                if *prev != value {
                    diagnostics.push(
                        Diagnostic::error()
                            .with_code(ErrorCode::DuplicateIdentifier)
                            .with_message(format!(
                                "redeclaration of `{name}` with value {value}, previously {prev}"
                            ))
                            .with_labels(vec![
                                loc.primary(),
                                locs[&name]
                                    .secondary()
                                    .with_message(format!("`{name}` is first declared here")),
                            ]),
                    );
                }
                continue;
            }

            table.values.insert(name.clone(), value);
            locs.insert(name.clone(), loc);
            match table.by_value.get(&value) {
                Some(&index) => table.aliases.push(Alias {
                    name,
                    canonical: table.canonical[index].name.clone(),
                    loc,
                }),
                None => {
                    table.by_value.insert(value, table.canonical.len());
                    table.canonical.push(ConstEntry { name, value });
                }
            }
        }

        for alias in &table.aliases {
            if table.resolve(&alias.name) != table.values.get(&alias.name).copied() {
                diagnostics.push(
                    Diagnostic::error()
                        .with_code(ErrorCode::InconsistentAlias)
                        .with_message(format!(
                            "alias `{}` does not resolve to its declared value through `{}`",
                            alias.name, alias.canonical
                        ))
                        .with_labels(vec![alias.loc.primary()]),
                );
            }
        }

        if table.canonical.is_empty() && diagnostics.is_empty() {
            diagnostics.push(
                Diagnostic::error()
                    .with_code(ErrorCode::EmptyIdTable)
                    .with_message("no identifier declaration found")
                    .with_labels(vec![SourceRange::new(file, 0, 0).primary()]),
            );
        }

        diagnostics.err_or(table)
    }
}

impl IdTable {
    /// Canonical constants, in declaration order.
    pub fn canonical(&self) -> &[ConstEntry] {
        &self.canonical
    }

    /// Aliases, in declaration order.
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn canonical_name(&self, value: i64) -> Option<&str> {
        self.by_value.get(&value).map(|index| self.canonical[*index].name.as_str())
    }

    /// Declared value of a canonical or alias name.
    pub fn value(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Value of `name` resolved through the alias and canonical tables.
    pub fn resolve(&self, name: &str) -> Option<i64> {
        let canonical = match self.aliases.iter().find(|alias| alias.name == name) {
            Some(alias) => alias.canonical.as_str(),
            None => name,
        };
        self.canonical.iter().find(|entry| entry.name == canonical).map(|entry| entry.value)
    }

    /// Canonical constants ascending by value, with placeholders
    /// filling every unused value between the lowest and highest.
    pub fn slots(&self) -> Vec<Slot<'_>> {
        let mut sorted: Vec<&ConstEntry> = self.canonical.iter().collect();
        sorted.sort_by_key(|entry| entry.value);
        let mut slots = vec![];
        let mut previous: Option<i64> = None;
        for entry in sorted {
            if let Some(previous) = previous {
                slots.extend((previous + 1..entry.value).map(Slot::Placeholder));
            }
            slots.push(Slot::Named(entry));
            previous = Some(entry.value);
        }
        slots
    }
}

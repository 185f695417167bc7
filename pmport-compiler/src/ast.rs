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

use codespan_reporting::diagnostic;
use codespan_reporting::files;
use serde::Serialize;
use std::fmt;

/// File identifier.
/// References a source file in the source database.
pub type FileId = usize;

/// Source database.
/// Stores the source file contents for reference.
pub type SourceDatabase = files::SimpleFiles<String, String>;

/// Byte range inside one file of the source database.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(file: FileId, start: usize, end: usize) -> SourceRange {
        SourceRange { file, start, end }
    }

    pub fn primary(&self) -> diagnostic::Label<FileId> {
        diagnostic::Label::primary(self.file, self.start..self.end)
    }

    pub fn secondary(&self) -> diagnostic::Label<FileId> {
        diagnostic::Label::secondary(self.file, self.start..self.end)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One declared numeric constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstEntry {
    pub name: String,
    pub value: i64,
}

/// Primitive types understood by the generated buffer API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Primitive {
    Bool,
    Byte,
    Short,
    LShort,
    Int,
    LInt,
    Long,
    LLong,
    Float,
    Double,
    Triad,
    LTriad,
    String,
}

impl Primitive {
    /// Look up the primitive named by the accessor suffix of a
    /// `get<Type>`/`put<Type>` call.
    pub fn from_tag(tag: &str) -> Option<Primitive> {
        Some(match tag {
            "Bool" => Primitive::Bool,
            "Byte" => Primitive::Byte,
            "Short" => Primitive::Short,
            "LShort" => Primitive::LShort,
            "Int" => Primitive::Int,
            "LInt" => Primitive::LInt,
            "Long" => Primitive::Long,
            "LLong" => Primitive::LLong,
            "Float" => Primitive::Float,
            "Double" => Primitive::Double,
            "Triad" => Primitive::Triad,
            "LTriad" => Primitive::LTriad,
            "String" => Primitive::String,
            _ => return None,
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Primitive::Bool => "Bool",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::LShort => "LShort",
            Primitive::Int => "Int",
            Primitive::LInt => "LInt",
            Primitive::Long => "Long",
            Primitive::LLong => "LLong",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
            Primitive::Triad => "Triad",
            Primitive::LTriad => "LTriad",
            Primitive::String => "String",
        }
    }

    /// Whether the primitive can carry a length prefix.
    pub fn is_integer(&self) -> bool {
        !matches!(self, Primitive::Bool | Primitive::Float | Primitive::Double | Primitive::String)
    }

    /// Go type of the value returned by `buf.Read<Type>()`.
    pub fn go_type(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Short | Primitive::LShort => "uint16",
            Primitive::Int | Primitive::LInt | Primitive::Triad | Primitive::LTriad => "uint32",
            Primitive::Long | Primitive::LLong => "uint64",
            Primitive::Float => "float32",
            Primitive::Double => "float64",
            Primitive::String => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type")]
pub enum FieldKind {
    Primitive(Primitive),
    /// Length prefix of the raw bytes of the field, written with the
    /// given primitive.
    LengthOf(Primitive),
    /// Statement that could not be recognized. The field name holds
    /// the raw statement text.
    Unknown,
}

/// Parsed unit describing one serialized field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    pub name: String,
}

impl FieldDescriptor {
    pub fn primitive(ty: Primitive, name: &str) -> FieldDescriptor {
        FieldDescriptor { kind: FieldKind::Primitive(ty), name: name.to_owned() }
    }

    pub fn length_of(ty: Primitive, name: &str) -> FieldDescriptor {
        FieldDescriptor { kind: FieldKind::LengthOf(ty), name: name.to_owned() }
    }

    pub fn unknown(statement: &str) -> FieldDescriptor {
        FieldDescriptor { kind: FieldKind::Unknown, name: statement.to_owned() }
    }

    /// Return the textual kind tag: `Byte`, `LengthOf_Int` or `Unknown`.
    pub fn kind_tag(&self) -> String {
        match &self.kind {
            FieldKind::Primitive(ty) => ty.tag().to_owned(),
            FieldKind::LengthOf(ty) => format!("LengthOf_{}", ty.tag()),
            FieldKind::Unknown => "Unknown".to_owned(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self.kind, FieldKind::Unknown)
    }
}

/// One unit of code generation work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketSpec {
    pub name: String,
    pub constants: Vec<ConstEntry>,
    /// Fields in wire order.
    pub fields: Vec<FieldDescriptor>,
}

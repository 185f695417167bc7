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

//! Parser for the restricted statement grammar of packet procedures.

use crate::ast::{FieldDescriptor, FieldKind, Primitive};
use pest::iterators::{Pair, Pairs};
use pest::Parser;

// Generate the statement parser.
//
// Only the handful of shapes produced by hand-written packet classes
// are recognized: buffer accessor calls on `$this`, optionally wrapped
// around a `strlen` length prefix, their assignment form used by
// decoders, and the buffer reset. Everything else fails to parse and
// is kept verbatim by the caller.
#[derive(pest_derive::Parser)]
#[grammar_inline = r#"
WHITESPACE = _{ " " | "\t" | "\r" | "\n" }

identifier = @{ (ASCII_ALPHA | "_") ~ (ASCII_ALPHANUMERIC | "_")* }
intvalue = @{ "-"? ~ ASCII_DIGIT+ }
hexvalue = @{ ("0x" | "0X") ~ ASCII_HEX_DIGIT+ }
integer = @{ hexvalue | intvalue }

VISIBILITY = @{ ("public" | "protected" | "private") ~ WHITESPACE }
CONST = @{ "const" ~ WHITESPACE }

constant_declaration = {
    SOI ~ VISIBILITY? ~ CONST ~ identifier ~ "=" ~ integer ~ ";"? ~ EOI
}

verb = { "get" | "put" }
type_tag = @{ ASCII_ALPHA_UPPER ~ (ASCII_ALPHANUMERIC | "_")* }
accessor = ${ verb ~ type_tag? }

member = { "$this" ~ "->" ~ identifier }
length_of = { "strlen" ~ "(" ~ member ~ ")" }
call = { "$this" ~ "->" ~ accessor ~ "(" ~ argument? ~ ")" }
argument = _{ length_of | call | member }

reset = { "$this" ~ "->" ~ "reset" ~ "(" ~ ")" }
assignment = { member ~ "=" ~ call }

statement = { SOI ~ (reset | assignment | call) ~ ";"? ~ EOI }
"#]
pub struct StatementParser;

type Node<'i> = Pair<'i, Rule>;

/// Direction of a buffer accessor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verb {
    Get,
    Put,
}

/// Call `$this-><verb><Type>(<argument>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub verb: Verb,
    /// Accessor type suffix, absent for raw byte accessors.
    pub type_tag: Option<String>,
    pub argument: Option<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// `$this->field`
    Field(String),
    /// `strlen($this->field)`
    LengthOf(String),
    Call(Box<Call>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Reset,
    Call(Call),
    Assign { field: String, call: Call },
}

/// A statement outside of the recognized grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized statement `{statement}`")]
pub struct StatementError {
    pub statement: String,
}

fn parse_identifier(node: Node<'_>) -> String {
    node.into_inner().next().map(|n| n.as_str().to_owned()).unwrap_or_default()
}

fn parse_call(node: Node<'_>) -> Call {
    let mut children = node.into_inner();
    let mut verb = Verb::Get;
    let mut type_tag = None;
    if let Some(accessor) = children.next() {
        for part in accessor.into_inner() {
            match part.as_rule() {
                Rule::verb if part.as_str() == "put" => verb = Verb::Put,
                Rule::type_tag => type_tag = Some(part.as_str().to_owned()),
                _ => (),
            }
        }
    }
    let argument = children.next().map(|arg| match arg.as_rule() {
        Rule::length_of => {
            Argument::LengthOf(arg.into_inner().next().map(parse_identifier).unwrap_or_default())
        }
        Rule::call => Argument::Call(Box::new(parse_call(arg))),
        _ => Argument::Field(parse_identifier(arg)),
    });
    Call { verb, type_tag, argument }
}

fn parse_toplevel(mut pairs: Pairs<'_, Rule>) -> Option<Statement> {
    let node = pairs.next()?.into_inner().next()?;
    Some(match node.as_rule() {
        Rule::reset => Statement::Reset,
        Rule::call => Statement::Call(parse_call(node)),
        Rule::assignment => {
            let mut children = node.into_inner();
            let field = parse_identifier(children.next()?);
            let call = parse_call(children.next()?);
            Statement::Assign { field, call }
        }
        _ => return None,
    })
}

/// Parse one cleaned statement.
pub fn parse_statement(text: &str) -> Result<Statement, StatementError> {
    StatementParser::parse(Rule::statement, text)
        .ok()
        .and_then(parse_toplevel)
        .ok_or_else(|| StatementError { statement: text.to_owned() })
}

/// Parse a `const NAME = <integer>` declaration.
///
/// Returns the declared name and value, or `None` when the line has
/// another shape or the value does not fit on 64 bits.
pub fn parse_constant(line: &str) -> Option<(String, i64)> {
    let root = StatementParser::parse(Rule::constant_declaration, line).ok()?.next()?;
    let mut name = None;
    let mut value = None;
    for node in root.into_inner() {
        match node.as_rule() {
            Rule::identifier => name = Some(node.as_str().to_owned()),
            Rule::integer => value = parse_integer(node.as_str()),
            _ => (),
        }
    }
    Some((name?, value?))
}

fn parse_integer(text: &str) -> Option<i64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn primitive(call: &Call) -> Option<Primitive> {
    call.type_tag.as_deref().and_then(Primitive::from_tag)
}

fn length_primitive(call: &Call) -> Option<Primitive> {
    primitive(call).filter(Primitive::is_integer)
}

/// Outcome of interpreting one statement against the field sequence.
enum Step {
    Field(FieldDescriptor),
    /// Raw bytes of the preceding length prefix.
    Folded,
    Elided,
    Unrecognized,
}

fn interpret(statement: &Statement, pending_bytes: Option<&str>) -> Step {
    match statement {
        Statement::Reset => Step::Elided,
        Statement::Call(call) => match (&call.type_tag, primitive(call), &call.argument) {
            (_, Some(ty), Some(Argument::Field(field))) => {
                Step::Field(FieldDescriptor::primitive(ty, field))
            }
            (_, Some(ty), Some(Argument::LengthOf(field))) if ty.is_integer() => {
                Step::Field(FieldDescriptor::length_of(ty, field))
            }
            (None, _, Some(Argument::Field(field))) if pending_bytes == Some(field.as_str()) => {
                Step::Folded
            }
            _ => Step::Unrecognized,
        },
        Statement::Assign { field, call } => match (&call.type_tag, primitive(call), &call.argument) {
            (_, Some(ty), None) => Step::Field(FieldDescriptor::primitive(ty, field)),
            (None, _, Some(Argument::Call(length))) if length.argument.is_none() => {
                match length_primitive(length) {
                    Some(ty) => Step::Field(FieldDescriptor::length_of(ty, field)),
                    None => Step::Unrecognized,
                }
            }
            _ => Step::Unrecognized,
        },
    }
}

/// Convert the cleaned statements of one procedure body into field
/// descriptors, in wire order.
///
/// The raw byte statement following a length prefix of the same field
/// is folded into the `LengthOf` descriptor. Statements outside of the
/// grammar become `Unknown` descriptors holding the statement text.
pub fn parse_fields<S: AsRef<str>>(statements: &[S]) -> Vec<FieldDescriptor> {
    let mut fields: Vec<FieldDescriptor> = vec![];
    let mut pending_bytes: Option<String> = None;
    for text in statements.iter().map(AsRef::as_ref) {
        if text.is_empty() {
            continue;
        }
        let step = match parse_statement(text) {
            Ok(statement) => interpret(&statement, pending_bytes.as_deref()),
            Err(_) => Step::Unrecognized,
        };
        match step {
            Step::Field(field) => {
                pending_bytes = match field.kind {
                    FieldKind::LengthOf(_) => Some(field.name.clone()),
                    _ => None,
                };
                fields.push(field)
            }
            Step::Folded => pending_bytes = None,
            Step::Elided => (),
            Step::Unrecognized => {
                pending_bytes = None;
                fields.push(FieldDescriptor::unknown(text))
            }
        }
    }
    fields
}

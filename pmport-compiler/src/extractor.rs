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

//! Extraction of the packet class body and its procedures.

use codespan_reporting::diagnostic::Diagnostic;
use std::ops::Range;

use crate::ast::{ConstEntry, FileId, SourceRange};
use crate::brackets::{self, BRACES, PARENS};
use crate::config::Config;
use crate::diagnostics::ErrorCode;
use crate::ids::{strip_comments, upper_to_pascal};
use crate::parser;

/// Body of an encode or decode procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub loc: SourceRange,
    /// Cleaned, non-empty statements in source order.
    pub statements: Vec<String>,
}

/// Parts of a packet class relevant to code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketClass {
    pub loc: SourceRange,
    /// Numeric class constants, in declaration order.
    pub constants: Vec<ConstEntry>,
    pub encode: Option<Procedure>,
    pub decode: Option<Procedure>,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Find the standalone word `word` in `text[range]`, starting the
/// search at `range.start`. Returns the offset of the first match.
fn find_word(text: &str, range: Range<usize>, word: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    text[range.clone()].match_indices(word).map(|(index, _)| range.start + index).find(|&start| {
        let end = start + word.len();
        let before = start.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(end).copied();
        !before.is_some_and(is_ident_byte) && !after.is_some_and(is_ident_byte)
    })
}

fn skip_whitespace(text: &str, offset: usize) -> usize {
    offset + (text.len() - offset - text[offset..].trim_start().len())
}

fn unbalanced(file: FileId, open: usize, what: &str) -> Diagnostic<FileId> {
    Diagnostic::error()
        .with_code(ErrorCode::UnbalancedBrackets)
        .with_message(format!("unbalanced brackets in {what}"))
        .with_labels(vec![SourceRange::new(file, open, open + 1)
            .primary()
            .with_message("this bracket is never closed")])
}

/// Remove whitespace and semicolon noise from a statement.
pub fn clean_statement(line: &str) -> String {
    line.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace()).to_owned()
}

/// Locate the class extending one of the configured base classes.
///
/// Returns the range of the class body, excluding the braces.
fn find_class(file: FileId, text: &str, config: &Config) -> Result<Range<usize>, Diagnostic<FileId>> {
    let extends = config
        .base_classes
        .iter()
        .filter_map(|base| {
            let mut from = 0;
            while let Some(start) = find_word(text, from..text.len(), "extends") {
                let name = skip_whitespace(text, start + "extends".len());
                if find_word(text, name..text.len(), base) == Some(name) {
                    return Some(name + base.len());
                }
                from = start + "extends".len();
            }
            None
        })
        .min();

    let Some(extends) = extends else {
        return Err(Diagnostic::error()
            .with_code(ErrorCode::MissingPacketClass)
            .with_message(format!(
                "no class extending {} found",
                config.base_classes.join(" or ")
            ))
            .with_labels(vec![SourceRange::new(file, 0, 0).primary()]));
    };

    match brackets::find_block(text, extends, BRACES) {
        Ok(Some(body)) => Ok(body),
        Ok(None) => Err(Diagnostic::error()
            .with_code(ErrorCode::MissingPacketClass)
            .with_message("packet class has no body")
            .with_labels(vec![SourceRange::new(file, extends, extends).primary()])),
        Err(open) => Err(unbalanced(file, open, "class body")),
    }
}

/// Locate the procedure `name` inside the class body.
fn find_procedure(
    file: FileId,
    text: &str,
    class: &Range<usize>,
    name: &str,
) -> Result<Option<Procedure>, Diagnostic<FileId>> {
    let mut from = class.start;
    let declaration = loop {
        let Some(start) = find_word(text, from..class.end, name) else {
            return Ok(None);
        };
        let prefix = text[class.start..start].trim_end();
        let params = skip_whitespace(text, start + name.len());
        if prefix.ends_with("function") && text.as_bytes().get(params) == Some(&b'(') {
            break start..params;
        }
        from = start + name.len();
    };

    let Some(params_end) = brackets::match_bracket(text, declaration.end, PARENS) else {
        return Err(unbalanced(file, declaration.end, "procedure parameters"));
    };
    let after_params = params_end + 1;
    let body_start = text
        .get(after_params..class.end)
        .and_then(|rest| rest.find(['{', ';']))
        .map(|n| after_params + n);
    let missing_body = || {
        Diagnostic::error()
            .with_code(ErrorCode::MissingProcedureBody)
            .with_message(format!("procedure `{name}` is declared without a body"))
            .with_labels(vec![SourceRange::new(file, declaration.start, declaration.end).primary()])
    };
    let open = match body_start {
        Some(open) if text.as_bytes()[open] == b'{' => open,
        _ => return Err(missing_body()),
    };
    let Some(close) = brackets::match_bracket(text, open, BRACES) else {
        return Err(unbalanced(file, open, &format!("procedure `{name}`")));
    };

    let statements = text[open + 1..close]
        .lines()
        .map(clean_statement)
        .filter(|statement| !statement.is_empty())
        .collect();
    Ok(Some(Procedure { loc: SourceRange::new(file, open, close + 1), statements }))
}

/// Extract the packet class of one source file.
pub fn extract(file: FileId, source: &str, config: &Config) -> Result<PacketClass, Diagnostic<FileId>> {
    // Offsets are preserved so that labels point into `source`.
    let text = strip_comments(source);
    let class = find_class(file, &text, config)?;

    let constants = text[class.clone()]
        .lines()
        .map(clean_statement)
        .filter_map(|line| parser::parse_constant(&line))
        .filter(|(name, _)| *name != config.reserved_constant)
        .map(|(name, value)| ConstEntry { name: upper_to_pascal(&name), value })
        .collect();

    let encode = find_procedure(file, &text, &class, &config.encode_procedure)?;
    let decode = find_procedure(file, &text, &class, &config.decode_procedure)?;

    Ok(PacketClass {
        loc: SourceRange::new(file, class.start, class.end),
        constants,
        encode,
        decode,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const MOVE_PLAYER: &str = r#"<?php
namespace pocketmine\network\protocol;

#include <rules/DataPacket.h>

class MovePlayerPacket extends DataPacket{
	const NETWORK_ID = Info::MOVE_PLAYER_PACKET;
	const MODE_NORMAL = 0;
	const MODE_RESET = 1;

	public $eid;
	public $yaw;

	public function decode(){
		$this->eid = $this->getLong();
		$this->yaw = $this->getFloat();
	}

	public function encode(){
		$this->reset();
		$this->putLong($this->eid);
		$this->putFloat($this->yaw);
	}
}
"#;

    fn extract_default(source: &str) -> Result<PacketClass, Diagnostic<FileId>> {
        extract(0, source, &Config::default())
    }

    #[test]
    fn test_clean_statement() {
        assert_eq!(clean_statement("\t\t$this->putLong($this->eid);  "), "$this->putLong($this->eid)");
        assert_eq!(clean_statement("  ;; "), "");
    }

    #[test]
    fn test_extract_move_player() {
        let class = extract_default(MOVE_PLAYER).unwrap();
        assert_eq!(
            class.constants,
            vec![
                ConstEntry { name: "ModeNormal".to_owned(), value: 0 },
                ConstEntry { name: "ModeReset".to_owned(), value: 1 },
            ]
        );
        assert_eq!(
            class.encode.unwrap().statements,
            vec!["$this->reset()", "$this->putLong($this->eid)", "$this->putFloat($this->yaw)"]
        );
        assert_eq!(
            class.decode.unwrap().statements,
            vec!["$this->eid = $this->getLong()", "$this->yaw = $this->getFloat()"]
        );
    }

    #[test]
    fn test_empty_procedures() {
        let class = extract_default(
            "class PingPacket extends DataPacket {\n public function decode(){\n\n}\n public function encode(){ }\n}",
        )
        .unwrap();
        assert!(class.encode.unwrap().statements.is_empty());
        assert!(class.decode.unwrap().statements.is_empty());
        assert!(class.constants.is_empty());
    }

    #[test]
    fn test_missing_procedures() {
        let class = extract_default("class A extends DataPacket {}").unwrap();
        assert_eq!(class.encode, None);
        assert_eq!(class.decode, None);
    }

    #[test]
    fn test_braces_in_comments_are_ignored() {
        let class = extract_default(
            "class A extends DataPacket {\n // {\n public function encode(){\n /* } */ $this->putByte($this->a);\n }\n}",
        )
        .unwrap();
        assert_eq!(class.encode.unwrap().statements, vec!["$this->putByte($this->a)"]);
    }

    #[test]
    fn test_missing_class() {
        let err = extract_default("class A extends Other {}").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("E4"));
        let err = extract_default("class A extends DataPacketBase {}").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("E4"));
    }

    #[test]
    fn test_unbalanced_class() {
        let err = extract_default("class A extends DataPacket {\n public function encode(){\n").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("E5"));
    }

    #[test]
    fn test_unbalanced_parameters() {
        let err = extract_default("class A extends DataPacket { function encode( }").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("E5"));
    }

    #[test]
    fn test_procedure_without_body() {
        let err = extract_default("class A extends DataPacket { abstract function encode(); }").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("E6"));
    }

    #[test]
    fn test_procedure_name_requires_declaration() {
        let class = extract_default(
            "class A extends DataPacket {\n public function test(){ $this->encode(); }\n}",
        )
        .unwrap();
        assert_eq!(class.encode, None);
    }
}

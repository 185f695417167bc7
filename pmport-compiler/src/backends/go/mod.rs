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

//! Go backend for the lav7 `buffer.Buffer` runtime.

use crate::config::{Config, IdType};
use crate::driver::{Outcome, RunContext};
use crate::ids::IdTable;

pub mod ids;
pub mod packet;
pub mod preamble;
pub mod template;

fn generate_interface(id_type: &IdType) -> String {
    let mut code = String::from("// Packet is a network packet of the protocol.\n");
    code.push_str("type Packet interface {\n");
    code.push_str(&format!("\tPid() {}\n", id_type.name));
    code.push_str("\tRead(buf *buffer.Buffer)\n");
    code.push_str("\tWrite() *buffer.Buffer\n");
    code.push_str("}\n\n");
    code
}

/// Constructor table of every canonical packet. Packets left to a
/// manual port are listed commented out.
fn generate_dispatch(id_type: &IdType, outcomes: &[Outcome]) -> String {
    let mut code = format!("var packets = map[{}]func() Packet{{\n", id_type.name);
    for outcome in outcomes {
        let name = outcome.name();
        let entry =
            format!("{}: func() Packet {{ return new({}) }},", id_type.constant(name), name);
        match outcome {
            Outcome::Fallback(_) => code.push_str(&format!("\t// {}\n", entry)),
            _ => code.push_str(&format!("\t{}\n", entry)),
        }
    }
    code.push_str("}\n\n");
    code
}

/// Imports of a packets run; the template imports are added only when
/// the container template is emitted.
fn imports(config: &Config, outcomes: &[Outcome]) -> Vec<String> {
    let mut imports = config.imports.clone();
    if outcomes.iter().any(|outcome| matches!(outcome, Outcome::Template { .. })) {
        imports.extend(config.template_imports.iter().cloned());
    }
    imports.sort();
    imports.dedup();
    imports
}

/// Generate the Go file of a packets run.
pub fn generate(ctx: &RunContext, outcomes: &[Outcome]) -> String {
    let Config { package, id_type, .. } = &ctx.config;
    let mut code = String::new();
    code.push_str(&preamble::generate(&ctx.origin, package, &imports(&ctx.config, outcomes)));
    code.push_str(&ids::generate(&ctx.table, id_type));
    code.push_str(&generate_interface(id_type));
    code.push_str(&generate_dispatch(id_type, outcomes));
    for outcome in outcomes {
        match outcome {
            Outcome::Generated(spec) => code.push_str(&packet::generate(spec, id_type)),
            Outcome::Template { name } => {
                code.push_str(&template::render(&ctx.batch_template, name, id_type))
            }
            Outcome::Fallback(fallback) => code.push_str(&template::fallback(fallback)),
        }
    }
    code
}

/// Generate a standalone Go file declaring an identifier table.
pub fn generate_ids(origin: &str, package: &str, table: &IdTable, id_type: &IdType) -> String {
    let mut code = preamble::generate(origin, package, &[]);
    code.push_str(&ids::generate(table, id_type));
    code
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::{MemorySources, Verbatim};
    use crate::ids::{declaration_lines, IdTableBuilder};
    use crate::test_utils::assert_contains;

    const INFO: &str = "const LOGIN_PACKET = 0x8f;\nconst TEXT_PACKET = 0x93;\nconst BATCH_PACKET = 0x92;\n";

    const TEXT: &str = r#"<?php
class TextPacket extends DataPacket{
	const NETWORK_ID = Info::TEXT_PACKET;

	const TYPE_RAW = 0;

	public $type;
	public $message;

	public function decode(){
		$this->type = $this->getByte();
		$this->message = $this->getString();
	}

	public function encode(){
		$this->reset();
		$this->putByte($this->type);
		$this->putString($this->message);
	}
}
"#;

    fn run(packets: &MemorySources) -> String {
        let mut ctx = RunContext::from_source(Config::default(), "Info.php", INFO.to_owned()).unwrap();
        ctx.run(packets, &Verbatim).unwrap()
    }

    #[test]
    fn test_sections_are_ordered() {
        let code = run(&MemorySources::new(Config::default()).with("Text", TEXT));
        let sections = [
            "// Code generated by pmportc from Info.php. DO NOT EDIT.",
            "type PacketID byte",
            "LoginHead PacketID = iota + 143",
            "var packetIdValues",
            "var packetIdNames",
            "func PacketIDFromString",
            "type Packet interface",
            "var packets = map[PacketID]func() Packet{",
            "// LoginPacket.php: automatic port failed.",
            "type Text struct",
            "type Batch struct",
        ];
        let offsets: Vec<usize> = sections
            .iter()
            .map(|section| code.find(section).unwrap_or_else(|| panic!("missing {section:?}")))
            .collect();
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]), "{code}");
    }

    #[test]
    fn test_dispatch_skips_fallbacks() {
        let code = run(&MemorySources::new(Config::default()).with("Text", TEXT));
        assert_contains(&code, "\t// LoginHead: func() Packet { return new(Login) },\n");
        assert_contains(&code, "\tTextHead: func() Packet { return new(Text) },\n");
        assert_contains(&code, "\tBatchHead: func() Packet { return new(Batch) },\n");
    }

    #[test]
    fn test_text_packet() {
        let code = run(&MemorySources::new(Config::default()).with("Text", TEXT));
        assert_contains(&code, "const (\n\tTextTypeRaw byte = 0\n)\n");
        assert_contains(&code, "type Text struct {\n\tType byte\n\tMessage string\n}\n");
        assert_contains(&code, "\ti.Type = buf.ReadByte()\n\ti.Message = buf.ReadString()\n");
    }

    #[test]
    fn test_local_constants_are_qualified() {
        let login = TEXT.replace("TextPacket", "LoginPacket").replace("TEXT_PACKET", "LOGIN_PACKET");
        let code = run(&MemorySources::new(Config::default()).with("Text", TEXT).with("Login", &login));
        assert_contains(&code, "\tTextTypeRaw byte = 0\n");
        assert_contains(&code, "\tLoginTypeRaw byte = 0\n");
        assert!(!code.contains("\tTypeRaw "));
    }

    #[test]
    fn test_template_imports() {
        let code = run(&MemorySources::new(Config::default()).with("Text", TEXT));
        assert_contains(
            &code,
            "import (\n\t\"github.com/L7-MCPE/lav7/util\"\n\t\"github.com/L7-MCPE/lav7/util/buffer\"\n)\n",
        );

        let info = "const LOGIN_PACKET = 0x8f;\nconst TEXT_PACKET = 0x93;\n";
        let mut ctx = RunContext::from_source(Config::default(), "Info.php", info.to_owned()).unwrap();
        let code = ctx.run(&MemorySources::new(Config::default()).with("Text", TEXT), &Verbatim).unwrap();
        assert_contains(&code, "import \"github.com/L7-MCPE/lav7/util/buffer\"\n");
        assert!(!code.contains("\"github.com/L7-MCPE/lav7/util\""));
    }

    #[test]
    fn test_generate_ids() {
        let table = IdTableBuilder::new()
            .build(0, &declaration_lines("const AIR = 0;\nconst STONE = 1;\n"))
            .unwrap();
        let id_type = IdType { name: "BlockID".to_owned(), repr: "byte".to_owned(), suffix: String::new() };
        let code = generate_ids("BlockIds.php", "types", &table, &id_type);
        assert!(code.starts_with("// Code generated by pmportc from BlockIds.php. DO NOT EDIT.\n\npackage types\n\n// BlockID"));
        assert!(!code.contains("import"));
        assert!(!code.contains("var packets"));
    }
}

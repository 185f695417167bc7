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

//! Go declarations of one analyzed packet.

use heck::ToUpperCamelCase;

use crate::ast::{ConstEntry, FieldDescriptor, FieldKind, PacketSpec};
use crate::config::IdType;

/// Smallest Go integer type holding `value`.
pub fn constant_type(value: i64) -> &'static str {
    if value < 0 {
        "int64"
    } else if value <= u8::MAX as i64 {
        "byte"
    } else if value <= u16::MAX as i64 {
        "uint16"
    } else if value <= u32::MAX as i64 {
        "uint32"
    } else {
        "uint64"
    }
}

/// Methods of the `Packet` interface; struct members may not reuse them.
const METHODS: [&str; 3] = ["Pid", "Read", "Write"];

/// Exported Go member name of a source field.
pub fn member_name(field: &str) -> String {
    match field.to_upper_camel_case() {
        name if name.is_empty() => "Field".to_owned(),
        name if METHODS.contains(&name.as_str()) => format!("{}_", name),
        name => name,
    }
}

/// Package level name of a packet local constant.
pub fn constant_name(packet: &str, constant: &str) -> String {
    format!("{}{}", packet, constant)
}

/// Struct members in first appearance order, one per field name.
fn members(fields: &[FieldDescriptor]) -> Vec<(String, &'static str)> {
    let mut members: Vec<(String, &'static str)> = vec![];
    for field in fields {
        let ty = match &field.kind {
            FieldKind::Primitive(ty) => ty.go_type(),
            FieldKind::LengthOf(_) => "[]byte",
            FieldKind::Unknown => continue,
        };
        let name = member_name(&field.name);
        if !members.iter().any(|(member, _)| *member == name) {
            members.push((name, ty));
        }
    }
    members
}

fn unexpected(statement: &str) -> String {
    format!("\t// Unexpected code: {}\n", statement)
}

fn generate_constants(packet: &str, constants: &[ConstEntry]) -> String {
    if constants.is_empty() {
        return String::new();
    }
    let mut code = String::from("const (\n");
    for constant in constants {
        code.push_str(&format!(
            "\t{} {} = {}\n",
            constant_name(packet, &constant.name),
            constant_type(constant.value),
            constant.value
        ));
    }
    code.push_str(")\n\n");
    code
}

fn generate_struct(name: &str, fields: &[FieldDescriptor]) -> String {
    let members = members(fields);
    if members.is_empty() {
        return format!("type {} struct{{}}\n\n", name);
    }
    let mut code = format!("type {} struct {{\n", name);
    for (member, ty) in members {
        code.push_str(&format!("\t{} {}\n", member, ty));
    }
    code.push_str("}\n\n");
    code
}

fn generate_read(name: &str, fields: &[FieldDescriptor]) -> String {
    let mut code = String::from("// Read implements Packet interface.\n");
    if fields.is_empty() {
        code.push_str(&format!("func (i *{}) Read(buf *buffer.Buffer) {{}}\n\n", name));
        return code;
    }
    code.push_str(&format!("func (i *{}) Read(buf *buffer.Buffer) {{\n", name));
    for field in fields {
        match &field.kind {
            FieldKind::Primitive(ty) => code.push_str(&format!(
                "\ti.{} = buf.Read{}()\n",
                member_name(&field.name),
                ty.tag()
            )),
            FieldKind::LengthOf(ty) => code.push_str(&format!(
                "\ti.{} = buf.Read(uint32(buf.Read{}()))\n",
                member_name(&field.name),
                ty.tag()
            )),
            FieldKind::Unknown => code.push_str(&unexpected(&field.name)),
        }
    }
    code.push_str("}\n\n");
    code
}

fn generate_write(name: &str, fields: &[FieldDescriptor]) -> String {
    let mut code = String::from("// Write implements Packet interface.\n");
    code.push_str(&format!("func (i {}) Write() *buffer.Buffer {{\n", name));
    code.push_str("\tbuf := new(buffer.Buffer)\n");
    for field in fields {
        let member = member_name(&field.name);
        match &field.kind {
            FieldKind::Primitive(ty) => {
                code.push_str(&format!("\tbuf.Write{}(i.{})\n", ty.tag(), member))
            }
            FieldKind::LengthOf(ty) => {
                code.push_str(&format!(
                    "\tbuf.Write{}({}(len(i.{})))\n",
                    ty.tag(),
                    ty.go_type(),
                    member
                ));
                code.push_str(&format!("\tbuf.Write(i.{})\n", member));
            }
            FieldKind::Unknown => code.push_str(&unexpected(&field.name)),
        }
    }
    code.push_str("\treturn buf\n}\n\n");
    code
}

/// Generate the constants, struct and procedures of one packet.
pub fn generate(spec: &PacketSpec, id_type: &IdType) -> String {
    let mut code = String::new();
    code.push_str(&generate_constants(&spec.name, &spec.constants));
    code.push_str(&generate_struct(&spec.name, &spec.fields));
    code.push_str("// Pid implements Packet interface.\n");
    code.push_str(&format!(
        "func (i {}) Pid() {} {{ return {} }}\n\n",
        spec.name,
        id_type.name,
        id_type.constant(&spec.name)
    ));
    code.push_str(&generate_read(&spec.name, &spec.fields));
    code.push_str(&generate_write(&spec.name, &spec.fields));
    code
}

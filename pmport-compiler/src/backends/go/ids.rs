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

//! Identifier table: named type, enumeration, aliases and lookups.

use heck::ToLowerCamelCase;

use crate::config::IdType;
use crate::ids::{IdTable, Slot};

fn iota(base: i64) -> String {
    match base {
        0 => "iota".to_owned(),
        base if base > 0 => format!("iota + {}", base),
        base => format!("iota - {}", base.unsigned_abs()),
    }
}

fn generate_type(id_type: &IdType, var: &str) -> String {
    let name = &id_type.name;
    let mut code = String::new();
    code.push_str(&format!("// {} is a declared numeric identifier.\n", name));
    code.push_str(&format!("type {} {}\n\n", name, id_type.repr));
    code.push_str("// String returns the declared name of the identifier.\n");
    code.push_str(&format!("func (id {}) String() string {{\n", name));
    code.push_str(&format!("\tif name, ok := {}Names[id]; ok {{\n", var));
    code.push_str("\t\treturn name\n\t}\n\treturn \"Unknown\"\n}\n\n");
    code
}

/// Enumeration following the slot sequence of the canonical table.
fn generate_enum(table: &IdTable, id_type: &IdType) -> String {
    let slots = table.slots();
    if slots.is_empty() {
        return String::new();
    }
    let mut code = String::from("const (\n");
    for (index, slot) in slots.iter().enumerate() {
        match slot {
            Slot::Named(entry) if index == 0 => code.push_str(&format!(
                "\t{} {} = {} // {}\n",
                id_type.constant(&entry.name),
                id_type.name,
                iota(entry.value),
                entry.value
            )),
            Slot::Named(entry) => {
                code.push_str(&format!("\t{} // {}\n", id_type.constant(&entry.name), entry.value))
            }
            Slot::Placeholder(value) => code.push_str(&format!("\t_ // {}\n", value)),
        }
    }
    code.push_str(")\n\n");
    code
}

fn generate_aliases(table: &IdTable, id_type: &IdType) -> String {
    if table.aliases().is_empty() {
        return String::new();
    }
    let mut code = String::from("const (\n");
    for alias in table.aliases() {
        code.push_str(&format!(
            "\t{} = {}\n",
            id_type.constant(&alias.name),
            id_type.constant(&alias.canonical)
        ));
    }
    code.push_str(")\n\n");
    code
}

fn generate_lookups(table: &IdTable, id_type: &IdType, var: &str) -> String {
    let name = &id_type.name;
    let mut code = String::new();

    code.push_str(&format!("var {}Values = map[string]{}{{\n", var, name));
    let names = table
        .canonical()
        .iter()
        .map(|entry| &entry.name)
        .chain(table.aliases().iter().map(|alias| &alias.name));
    for declared in names {
        code.push_str(&format!("\t\"{}\": {},\n", declared, id_type.constant(declared)));
    }
    code.push_str("}\n\n");

    code.push_str(&format!("var {}Names = map[{}]string{{\n", var, name));
    for entry in table.canonical() {
        code.push_str(&format!("\t{}: \"{}\",\n", id_type.constant(&entry.name), entry.name));
    }
    code.push_str("}\n\n");

    code.push_str(&format!("// {}FromString returns the identifier declared as name.\n", name));
    code.push_str(&format!("func {}FromString(name string) ({}, bool) {{\n", name, name));
    code.push_str(&format!("\tid, ok := {}Values[name]\n\treturn id, ok\n}}\n\n", var));
    code
}

/// Generate the identifier table declarations.
pub fn generate(table: &IdTable, id_type: &IdType) -> String {
    let var = id_type.name.to_lower_camel_case();
    let mut code = String::new();
    code.push_str(&generate_type(id_type, &var));
    code.push_str(&generate_enum(table, id_type));
    code.push_str(&generate_aliases(table, id_type));
    code.push_str(&generate_lookups(table, id_type, &var));
    code
}

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

//! Fixed templates and the manual port notes of fallback packets.

use crate::config::IdType;
use crate::driver::Fallback;

/// Substitute the template placeholders for the packet `name`.
pub fn render(template: &str, name: &str, id_type: &IdType) -> String {
    let mut code = template
        .replace("$ID_TYPE", &id_type.name)
        .replace("$ID", &id_type.constant(name))
        .replace("$NAME", name);
    if !code.ends_with('\n') {
        code.push('\n');
    }
    code.push('\n');
    code
}

fn comment(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                "//\n".to_owned()
            } else {
                format!("// {}\n", line)
            }
        })
        .collect()
}

/// Commented block carrying the diagnostic and the original source of
/// a packet to port by hand.
pub fn fallback(fallback: &Fallback) -> String {
    let mut code = String::new();
    code.push_str(&format!("// {}: automatic port failed.\n", fallback.file_name));
    code.push_str("// Read the original code below and port it manually.\n//\n");
    code.push_str(&comment(&fallback.diagnostic));
    if let Some(source) = &fallback.source {
        code.push_str("//\n");
        code.push_str(&comment(source));
    }
    code.push('\n');
    code
}

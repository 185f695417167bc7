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

/// Header, package clause and imports of a generated Go file.
pub fn generate(origin: &str, package: &str, imports: &[String]) -> String {
    let mut code = String::new();
    code.push_str(&format!("// Code generated by pmportc from {}. DO NOT EDIT.\n\n", origin));
    code.push_str(&format!("package {}\n\n", package));
    match imports {
        [] => (),
        [import] => code.push_str(&format!("import \"{}\"\n\n", import)),
        imports => {
            code.push_str("import (\n");
            for import in imports {
                code.push_str(&format!("\t\"{}\"\n", import));
            }
            code.push_str(")\n\n");
        }
    }
    code
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_preamble() {
        assert_eq!(
            generate("Info.php", "proto", &[]),
            "// Code generated by pmportc from Info.php. DO NOT EDIT.\n\npackage proto\n\n"
        );
        assert_eq!(
            generate("Info.php", "proto", &["a/b".to_owned()]),
            "// Code generated by pmportc from Info.php. DO NOT EDIT.\n\npackage proto\n\nimport \"a/b\"\n\n"
        );
        assert_eq!(
            generate("Info.php", "proto", &["a".to_owned(), "b".to_owned()]),
            "// Code generated by pmportc from Info.php. DO NOT EDIT.\n\npackage proto\n\nimport (\n\t\"a\"\n\t\"b\"\n)\n\n"
        );
    }
}

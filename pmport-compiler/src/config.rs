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

//! Generator configuration.
//!
//! Every setting has a default matching the PocketMine-MP sources and
//! the lav7 Go runtime, so an empty JSON object is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Error;

/// Go type used for the identifier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdType {
    /// Name of the generated named type, e.g. `PacketID`.
    pub name: String,
    /// Underlying Go integer type, e.g. `byte`.
    pub repr: String,
    /// Suffix appended to every constant name, e.g. `Head`.
    #[serde(default)]
    pub suffix: String,
}

impl IdType {
    /// Name of the Go constant for the identifier `name`.
    pub fn constant(&self, name: &str) -> String {
        format!("{}{}", name, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Go package of the generated file.
    pub package: String,
    /// Go import paths of the generated file.
    pub imports: Vec<String>,
    /// Go import paths needed only by the container template.
    pub template_imports: Vec<String>,
    /// Base classes marking a class as a packet definition.
    pub base_classes: Vec<String>,
    /// Class constant holding the packet type tag; never a packet
    /// local constant.
    pub reserved_constant: String,
    pub encode_procedure: String,
    pub decode_procedure: String,
    /// Extension of the packet source files.
    pub source_extension: String,
    /// Suffix of the identifier declarations naming packets.
    pub id_declaration_suffix: String,
    pub id_type: IdType,
    /// Packet emitted from the fixed container template.
    pub batch_packet: String,
    /// Replacement for the built-in container template.
    pub batch_template: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            package: "lav7".to_owned(),
            imports: vec!["github.com/L7-MCPE/lav7/util/buffer".to_owned()],
            template_imports: vec!["github.com/L7-MCPE/lav7/util".to_owned()],
            base_classes: vec!["DataPacket".to_owned()],
            reserved_constant: "NETWORK_ID".to_owned(),
            encode_procedure: "encode".to_owned(),
            decode_procedure: "decode".to_owned(),
            source_extension: "php".to_owned(),
            id_declaration_suffix: "_PACKET".to_owned(),
            id_type: IdType {
                name: "PacketID".to_owned(),
                repr: "byte".to_owned(),
                suffix: "Head".to_owned(),
            },
            batch_packet: "Batch".to_owned(),
            batch_template: None,
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Config, Error> {
        serde_json::from_str(text).map_err(|err| Error::Config(err.to_string()))
    }

    /// Load the configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Config, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::Io { path: path.to_owned(), err })?;
        Config::from_json(&text)
    }

    /// Name of the packet source file for the packet `name`.
    pub fn source_file_name(&self, name: &str) -> String {
        format!("{}Packet.{}", name, self.source_extension)
    }
}

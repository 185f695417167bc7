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

//! Fixture protocol for the end-to-end tests of the generator.

use std::path::{Path, PathBuf};

use pmport_compiler::config::Config;
use pmport_compiler::driver::{DirectorySources, Formatter, RunContext};
use pmport_compiler::Error;

/// Directory holding the fixture packet classes.
pub fn protocol_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join("protocol")
}

/// Fixture packet identifier declarations.
pub fn protocol_info() -> PathBuf {
    protocol_dir().join("Info.php")
}

/// Copy the fixture protocol into `dir`.
pub fn copy_protocol(dir: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(protocol_dir())? {
        let entry = entry?;
        std::fs::copy(entry.path(), dir.join(entry.file_name()))?;
    }
    Ok(())
}

/// Build the run context of the protocol declared in `dir`.
pub fn context(dir: &Path, config: Config) -> Result<RunContext, Error> {
    let path = dir.join("Info.php");
    let text = std::fs::read_to_string(&path).map_err(|err| Error::Io { path, err })?;
    RunContext::from_source(config, "Info.php", text)
}

/// Generate the Go file of the protocol in `dir`.
pub fn generate(dir: &Path, formatter: &dyn Formatter) -> Result<String, Error> {
    let config = Config::default();
    let packets = DirectorySources::new(dir, &config);
    context(dir, config)?.run(&packets, formatter)
}

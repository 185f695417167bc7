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

//! Generator run: packet enumeration, per-packet analysis, fallback
//! isolation and final formatting.

use codespan_reporting::diagnostic::Diagnostic;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use crate::ast::{FieldDescriptor, FileId, PacketSpec, SourceDatabase};
use crate::backends;
use crate::config::Config;
use crate::diagnostics::{self, ErrorCode};
use crate::extractor;
use crate::ids::{self, IdTable, IdTableBuilder};
use crate::parser;
use crate::Error;

/// Access to the packet source files.
pub trait PacketSources {
    /// Display name of the source file of the packet `name`.
    fn locate(&self, name: &str) -> String;

    /// Read the source file of the packet `name`.
    fn read(&self, name: &str) -> std::io::Result<String>;
}

/// Packet sources read from a protocol directory.
#[derive(Debug, Clone)]
pub struct DirectorySources {
    base: PathBuf,
    config: Config,
}

impl DirectorySources {
    pub fn new(base: &Path, config: &Config) -> DirectorySources {
        DirectorySources { base: base.to_owned(), config: config.clone() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.base.join(self.config.source_file_name(name))
    }
}

impl PacketSources for DirectorySources {
    fn locate(&self, name: &str) -> String {
        self.path(name).display().to_string()
    }

    fn read(&self, name: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.path(name))
    }
}

/// Packet sources held in memory, keyed by packet name.
#[derive(Debug, Clone)]
pub struct MemorySources {
    files: BTreeMap<String, String>,
    config: Config,
}

impl MemorySources {
    pub fn new(config: Config) -> MemorySources {
        MemorySources { files: BTreeMap::new(), config }
    }

    pub fn with(mut self, name: &str, source: &str) -> MemorySources {
        self.files.insert(name.to_owned(), source.to_owned());
        self
    }
}

impl PacketSources for MemorySources {
    fn locate(&self, name: &str) -> String {
        self.config.source_file_name(name)
    }

    fn read(&self, name: &str) -> std::io::Result<String> {
        self.files.get(name).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such packet source")
        })
    }
}

/// Final pass over the aggregate generated text.
pub trait Formatter {
    fn format(&self, code: String) -> Result<String, Error>;
}

/// Formatter returning the text unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Verbatim;

impl Formatter for Verbatim {
    fn format(&self, code: String) -> Result<String, Error> {
        Ok(code)
    }
}

/// Formatter piping the text through `gofmt -s`.
#[derive(Debug, Clone)]
pub struct Gofmt {
    pub program: PathBuf,
}

impl Default for Gofmt {
    fn default() -> Self {
        Gofmt { program: PathBuf::from("gofmt") }
    }
}

impl Gofmt {
    fn failure(&self, message: impl ToString) -> Error {
        Error::Formatter {
            program: self.program.display().to_string(),
            message: message.to_string(),
        }
    }
}

impl Formatter for Gofmt {
    fn format(&self, code: String) -> Result<String, Error> {
        let mut gofmt = Command::new(&self.program)
            .arg("-s")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.failure(err))?;

        let mut stdin = gofmt.stdin.take().ok_or_else(|| self.failure("stdin unavailable"))?;
        let writer = std::thread::spawn(move || stdin.write_all(code.as_bytes()));

        let output = gofmt.wait_with_output().map_err(|err| self.failure(err))?;
        match writer.join() {
            Ok(Ok(())) => (),
            Ok(Err(err)) => return Err(self.failure(err)),
            Err(_) => return Err(self.failure("input writer panicked")),
        }
        if !output.status.success() {
            return Err(self.failure(String::from_utf8_lossy(&output.stderr).trim()));
        }
        String::from_utf8(output.stdout).map_err(|err| self.failure(err))
    }
}

/// Packet that could not be ported automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    pub name: String,
    pub file_name: String,
    /// Error code of the diagnostic, e.g. `E7`.
    pub code: Option<String>,
    /// Diagnostic rendered as plain text.
    pub diagnostic: String,
    /// Original source, absent when it could not be read.
    pub source: Option<String>,
}

/// Result of processing one packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Generated(PacketSpec),
    /// Packet emitted from the container template.
    Template { name: String },
    Fallback(Fallback),
}

impl Outcome {
    pub fn name(&self) -> &str {
        match self {
            Outcome::Generated(spec) => &spec.name,
            Outcome::Template { name } => name,
            Outcome::Fallback(fallback) => &fallback.name,
        }
    }
}

/// Go container packet wrapping compressed packet batches.
///
/// `$NAME`, `$ID_TYPE` and `$ID` are substituted with the packet name,
/// the identifier type and the packet identifier constant.
pub const BATCH_TEMPLATE: &str = r#"type $NAME struct {
	Payloads [][]byte
}

// Pid implements Packet interface.
func (i $NAME) Pid() $ID_TYPE { return $ID }

// Read implements Packet interface.
func (i *$NAME) Read(buf *buffer.Buffer) {
	i.Payloads = make([][]byte, 0)
	payload, err := util.DecodeDeflate(buf.Read(uint32(buf.ReadInt())))
	if err != nil {
		return
	}
	b := buffer.FromBytes(payload)
	for b.Require(4) {
		size := b.ReadInt()
		i.Payloads = append(i.Payloads, b.Read(size))
	}
}

// Write implements Packet interface.
func (i $NAME) Write() *buffer.Buffer {
	b := new(buffer.Buffer)
	for _, payload := range i.Payloads {
		b.WriteInt(uint32(len(payload)))
		b.Write(payload)
	}
	buf := new(buffer.Buffer)
	payload := util.EncodeDeflate(b.Done())
	buf.WriteInt(uint32(len(payload)))
	buf.Write(payload)
	return buf
}
"#;

/// Load the container template named by the configuration, or the
/// built-in one.
pub fn load_batch_template(config: &Config) -> Result<String, Error> {
    match &config.batch_template {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| Error::Io { path: path.clone(), err }),
        None => Ok(BATCH_TEMPLATE.to_owned()),
    }
}

/// Parse the identifier declarations of `text` and build the tables.
pub fn build_table(
    sources: &mut SourceDatabase,
    name: &str,
    text: String,
    suffix: &str,
) -> Result<IdTable, Error> {
    let lines = ids::declaration_lines(&text);
    let file = sources.add(name.to_owned(), text);
    let table = IdTableBuilder::with_suffix(suffix)
        .build(file, &lines)
        .map_err(Error::Diagnostics)?;
    info!(
        canonical = table.canonical().len(),
        aliases = table.aliases().len(),
        "loaded identifier declarations from {name}"
    );
    Ok(table)
}

/// Analyze one packet source.
///
/// Fails when the class cannot be extracted or when both procedures
/// have bodies with differing numbers of recognized fields.
pub fn analyze(
    name: &str,
    file: FileId,
    source: &str,
    config: &Config,
) -> Result<PacketSpec, Diagnostic<FileId>> {
    fn descriptors(procedure: &Option<extractor::Procedure>) -> Vec<FieldDescriptor> {
        procedure.as_ref().map(|p| parser::parse_fields(&p.statements)).unwrap_or_default()
    }

    fn recognized(fields: &[FieldDescriptor]) -> usize {
        fields.iter().filter(|f| f.is_recognized()).count()
    }

    let class = extractor::extract(file, source, config)?;
    let encode = descriptors(&class.encode);
    let decode = descriptors(&class.decode);

    if let (Some(encoder), Some(decoder)) = (&class.encode, &class.decode) {
        let (written, read) = (recognized(&encode), recognized(&decode));
        if !encode.is_empty() && !decode.is_empty() && written != read {
            return Err(Diagnostic::error()
                .with_code(ErrorCode::AsymmetricProcedures)
                .with_message(format!(
                    "`{}` writes {written} fields but `{}` reads {read}",
                    config.encode_procedure, config.decode_procedure
                ))
                .with_labels(vec![
                    encoder.loc.primary().with_message(format!("{written} fields written here")),
                    decoder.loc.secondary().with_message(format!("{read} fields read here")),
                ]));
        }
    }

    let fields = if encode.is_empty() { decode } else { encode };
    for field in fields.iter().filter(|f| !f.is_recognized()) {
        debug!(packet = name, "unexpected statement `{}`", field.name);
    }
    Ok(PacketSpec { name: name.to_owned(), constants: class.constants, fields })
}

/// State of one generator run.
#[derive(Debug)]
pub struct RunContext {
    pub config: Config,
    /// Display name of the identifier declarations.
    pub origin: String,
    pub sources: SourceDatabase,
    pub table: IdTable,
    pub batch_template: String,
}

impl RunContext {
    pub fn new(
        config: Config,
        origin: &str,
        sources: SourceDatabase,
        table: IdTable,
        batch_template: String,
    ) -> RunContext {
        RunContext { config, origin: origin.to_owned(), sources, table, batch_template }
    }

    /// Build a context from the text of the identifier declarations.
    pub fn from_source(config: Config, name: &str, text: String) -> Result<RunContext, Error> {
        let mut sources = SourceDatabase::new();
        let table = build_table(&mut sources, name, text, &config.id_declaration_suffix)?;
        let batch_template = load_batch_template(&config)?;
        Ok(RunContext::new(config, name, sources, table, batch_template))
    }

    /// Names of the packets to port, in declaration order.
    pub fn packet_names(&self) -> Vec<String> {
        self.table.canonical().iter().map(|entry| entry.name.clone()).collect()
    }

    fn fallback(
        &self,
        name: &str,
        file_name: String,
        source: Option<String>,
        diagnostic: &Diagnostic<FileId>,
    ) -> Outcome {
        warn!(packet = name, "{}: {}", file_name, diagnostic.message);
        Outcome::Fallback(Fallback {
            name: name.to_owned(),
            file_name,
            code: diagnostic.code.clone(),
            diagnostic: diagnostics::render(&self.sources, diagnostic),
            source,
        })
    }

    /// Process one packet. Never fails: problems are isolated in a
    /// fallback outcome.
    pub fn process<S: PacketSources + ?Sized>(&mut self, packets: &S, name: &str) -> Outcome {
        if name == self.config.batch_packet {
            debug!(packet = name, "using the container template");
            return Outcome::Template { name: name.to_owned() };
        }

        let file_name = packets.locate(name);
        let source = match packets.read(name) {
            Ok(source) => source,
            Err(err) => {
                let diagnostic = Diagnostic::error()
                    .with_code(ErrorCode::UnreadableSource)
                    .with_message(format!("cannot read {file_name}: {err}"));
                return self.fallback(name, file_name, None, &diagnostic);
            }
        };

        let file = self.sources.add(file_name.clone(), source.clone());
        match analyze(name, file, &source, &self.config) {
            Ok(spec) => {
                debug!(packet = name, fields = spec.fields.len(), "generated");
                Outcome::Generated(spec)
            }
            Err(diagnostic) => self.fallback(name, file_name, Some(source), &diagnostic),
        }
    }

    /// Process every packet of the identifier table.
    pub fn outcomes<S: PacketSources + ?Sized>(&mut self, packets: &S) -> Vec<Outcome> {
        let outcomes: Vec<Outcome> =
            self.packet_names().iter().map(|name| self.process(packets, name)).collect();
        let fallbacks =
            outcomes.iter().filter(|outcome| matches!(outcome, Outcome::Fallback(_))).count();
        info!(packets = outcomes.len(), fallbacks, "processed packet sources");
        outcomes
    }

    /// Generate the Go file for every packet and pass it through the
    /// formatter.
    pub fn run<S: PacketSources + ?Sized>(
        &mut self,
        packets: &S,
        formatter: &dyn Formatter,
    ) -> Result<String, Error> {
        let outcomes = self.outcomes(packets);
        formatter.format(backends::go::generate(self, &outcomes))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{ConstEntry, Primitive};
    use crate::test_utils::assert_contains;

    const INFO: &str = "interface Info {\n const LOGIN_PACKET = 0x8f;\n const TEXT_PACKET = 0x93;\n const BATCH_PACKET = 0x92;\n}\n";

    fn context() -> RunContext {
        RunContext::from_source(Config::default(), "Info.php", INFO.to_owned()).unwrap()
    }

    fn analyze_source(source: &str) -> Result<PacketSpec, Diagnostic<FileId>> {
        analyze("Text", 0, source, &Config::default())
    }

    #[test]
    fn test_packet_names_follow_declaration_order() {
        assert_eq!(context().packet_names(), vec!["Login", "Text", "Batch"]);
    }

    #[test]
    fn test_analyze_prefers_encoder_fields() {
        let spec = analyze_source(
            "class TextPacket extends DataPacket {\n const TYPE_RAW = 0;\n public function decode(){\n $this->type = $this->getByte();\n $this->message = $this->getString();\n }\n public function encode(){\n $this->reset();\n $this->putByte($this->type);\n $this->putString($this->message);\n }\n}",
        )
        .unwrap();
        assert_eq!(spec.constants, vec![ConstEntry { name: "TypeRaw".to_owned(), value: 0 }]);
        assert_eq!(
            spec.fields,
            vec![
                FieldDescriptor::primitive(Primitive::Byte, "type"),
                FieldDescriptor::primitive(Primitive::String, "message"),
            ]
        );
    }

    #[test]
    fn test_analyze_uses_decoder_when_encoder_is_empty() {
        let spec = analyze_source(
            "class TextPacket extends DataPacket {\n public function decode(){\n $this->x = $this->getInt();\n }\n public function encode(){\n $this->reset();\n }\n}",
        )
        .unwrap();
        assert_eq!(spec.fields, vec![FieldDescriptor::primitive(Primitive::Int, "x")]);
    }

    #[test]
    fn test_analyze_rejects_asymmetric_procedures() {
        let err = analyze_source(
            "class TextPacket extends DataPacket {\n public function decode(){\n $this->x = $this->getInt();\n }\n public function encode(){\n $this->putInt($this->x);\n $this->putInt($this->y);\n }\n}",
        )
        .unwrap_err();
        assert_eq!(err.code.as_deref(), Some("E7"));
        assert_eq!(err.message, "`encode` writes 2 fields but `decode` reads 1");
    }

    #[test]
    fn test_unrecognized_statements_do_not_count() {
        let spec = analyze_source(
            "class TextPacket extends DataPacket {\n public function decode(){\n $this->x = $this->getInt();\n }\n public function encode(){\n $this->putInt($this->x);\n $this->putUUID($this->id);\n }\n}",
        )
        .unwrap();
        assert_eq!(spec.fields.len(), 2);
        assert!(!spec.fields[1].is_recognized());
    }

    #[test]
    fn test_process_batch_uses_template() {
        let mut ctx = context();
        let packets = MemorySources::new(Config::default());
        assert_eq!(ctx.process(&packets, "Batch"), Outcome::Template { name: "Batch".to_owned() });
    }

    #[test]
    fn test_process_missing_source() {
        let mut ctx = context();
        let packets = MemorySources::new(Config::default());
        let Outcome::Fallback(fallback) = ctx.process(&packets, "Login") else {
            panic!("expected a fallback");
        };
        assert_eq!(fallback.file_name, "LoginPacket.php");
        assert_eq!(fallback.code.as_deref(), Some("E8"));
        assert_eq!(fallback.source, None);
        assert_contains(&fallback.diagnostic, "no such packet source");
    }

    #[test]
    fn test_fallbacks_are_isolated() {
        let mut ctx = context();
        let packets = MemorySources::new(Config::default())
            .with("Login", "class LoginPacket extends DataPacket {")
            .with(
                "Text",
                "class TextPacket extends DataPacket {\n public function encode(){\n $this->putString($this->message);\n }\n}",
            );
        let outcomes = ctx.outcomes(&packets);
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(&outcomes[0], Outcome::Fallback(f) if f.code.as_deref() == Some("E5")));
        assert!(matches!(&outcomes[1], Outcome::Generated(spec) if spec.fields.len() == 1));
        assert!(matches!(&outcomes[2], Outcome::Template { .. }));
        assert_eq!(outcomes.iter().map(Outcome::name).collect::<Vec<_>>(), ["Login", "Text", "Batch"]);
    }

    #[test]
    fn test_fallback_renders_source_snippet() {
        let mut ctx = context();
        let source = "class LoginPacket extends DataPacket {\n public function encode();\n}";
        let packets = MemorySources::new(Config::default()).with("Login", source);
        let Outcome::Fallback(fallback) = ctx.process(&packets, "Login") else {
            panic!("expected a fallback");
        };
        assert_eq!(fallback.source.as_deref(), Some(source));
        assert_contains(&fallback.diagnostic, "error[E6]");
        assert_contains(&fallback.diagnostic, "LoginPacket.php");
    }

    #[test]
    fn test_invalid_declarations_are_fatal() {
        let err = RunContext::from_source(
            Config::default(),
            "Info.php",
            "const A_PACKET = 1;\nconst A_PACKET = 2;\n".to_owned(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Diagnostics(_)));
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let config = Config {
            batch_template: Some(PathBuf::from("/nonexistent/batch.go.tmpl")),
            ..Config::default()
        };
        let err = RunContext::from_source(config, "Info.php", INFO.to_owned()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_directory_sources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("TextPacket.php"), "<?php").unwrap();
        let packets = DirectorySources::new(dir.path(), &Config::default());
        assert_eq!(packets.read("Text").unwrap(), "<?php");
        assert!(packets.read("Login").is_err());
        assert!(packets.locate("Login").ends_with("LoginPacket.php"));
    }

    #[test]
    fn test_missing_formatter_is_fatal() {
        let gofmt = Gofmt { program: PathBuf::from("/nonexistent/gofmt") };
        assert!(matches!(gofmt.format("package x\n".to_owned()), Err(Error::Formatter { .. })));
    }
}

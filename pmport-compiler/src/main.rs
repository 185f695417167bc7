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

//! Generator porting PocketMine-MP packet classes to Go packet
//! definitions.

use argh::FromArgs;
use codespan_reporting::term::termcolor;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pmport_compiler::ast::SourceDatabase;
use pmport_compiler::config::{Config, IdType};
use pmport_compiler::driver::{self, DirectorySources, Formatter, Gofmt, RunContext, Verbatim};
use pmport_compiler::ids::IdTable;
use pmport_compiler::{backends, Error};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Go,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "go" => Ok(Self::Go),
            "json" => Ok(Self::Json),
            _ => Err(format!("could not parse {input:?}, valid option are 'go', 'json'.")),
        }
    }
}

#[derive(FromArgs, Debug)]
/// Port PocketMine-MP packet classes to Go packet definitions.
struct Opt {
    #[argh(switch)]
    /// print tool version and exit.
    version: bool,

    #[argh(subcommand)]
    command: Option<Subcommand>,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Subcommand {
    Packets(PacketsOpt),
    Ids(IdsOpt),
}

#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "packets")]
/// generate the Go definitions of every packet of a protocol directory.
struct PacketsOpt {
    #[argh(positional)]
    /// directory holding the packet classes.
    protocol_dir: PathBuf,

    #[argh(option)]
    /// file declaring the packet identifiers, e.g. ProtocolInfo.php.
    ids: PathBuf,

    #[argh(option)]
    /// JSON configuration file.
    config: Option<PathBuf>,

    #[argh(option)]
    /// output file. The output is printed on stdout if omitted.
    output: Option<PathBuf>,

    #[argh(option, default = "OutputFormat::Go")]
    /// generate output in this format ("go", "json").
    output_format: OutputFormat,

    #[argh(switch)]
    /// skip the gofmt pass.
    no_format: bool,

    #[argh(option)]
    /// path of the gofmt binary.
    gofmt: Option<PathBuf>,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "ids")]
/// generate a standalone Go identifier table from constant declarations.
struct IdsOpt {
    #[argh(positional)]
    /// file declaring the identifiers.
    declarations: PathBuf,

    #[argh(option, default = "String::from(\"ID\")")]
    /// name of the generated Go type.
    type_name: String,

    #[argh(option, default = "String::from(\"uint16\")")]
    /// underlying Go integer type.
    repr: String,

    #[argh(option, default = "String::from(\"lav7\")")]
    /// package name of the generated file.
    package: String,

    #[argh(option, default = "String::new()")]
    /// suffix appended to the generated constant names.
    suffix: String,

    #[argh(option, default = "String::new()")]
    /// only keep declarations ending with this suffix.
    declaration_suffix: String,

    #[argh(option)]
    /// output file. The output is printed on stdout if omitted.
    output: Option<PathBuf>,

    #[argh(switch)]
    /// skip the gofmt pass.
    no_format: bool,

    #[argh(option)]
    /// path of the gofmt binary.
    gofmt: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn formatter(no_format: bool, gofmt: &Option<PathBuf>) -> Box<dyn Formatter> {
    match (no_format, gofmt) {
        (true, _) => Box::new(Verbatim),
        (false, Some(program)) => Box::new(Gofmt { program: program.clone() }),
        (false, None) => Box::new(Gofmt::default()),
    }
}

/// Read the identifier declarations and build the tables, printing
/// the diagnostics on failure.
fn load_table(sources: &mut SourceDatabase, path: &Path, suffix: &str) -> Result<IdTable, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| Error::Io { path: path.to_owned(), err }.to_string())?;
    match driver::build_table(sources, &path.display().to_string(), text, suffix) {
        Ok(table) => Ok(table),
        Err(Error::Diagnostics(diagnostics)) => {
            let writer = termcolor::StandardStream::stderr(termcolor::ColorChoice::Auto);
            diagnostics
                .emit(sources, &mut writer.lock())
                .map_err(|err| format!("could not print diagnostics: {err}"))?;
            Err(String::from("Invalid identifier declarations"))
        }
        Err(err) => Err(err.to_string()),
    }
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), String> {
    match output {
        Some(path) => std::fs::write(path, content)
            .map_err(|err| Error::Io { path: path.to_owned(), err }.to_string()),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

fn generate_packets(opt: &PacketsOpt) -> Result<(), String> {
    let config = match &opt.config {
        Some(path) => Config::load(path).map_err(|err| err.to_string())?,
        None => Config::default(),
    };
    let mut sources = SourceDatabase::new();
    let table = load_table(&mut sources, &opt.ids, &config.id_declaration_suffix)?;
    let batch_template = driver::load_batch_template(&config).map_err(|err| err.to_string())?;
    let packets = DirectorySources::new(&opt.protocol_dir, &config);
    let origin = opt.ids.display().to_string();
    let mut ctx = RunContext::new(config, &origin, sources, table, batch_template);

    let output = match opt.output_format {
        OutputFormat::Go => ctx
            .run(&packets, formatter(opt.no_format, &opt.gofmt).as_ref())
            .map_err(|err| err.to_string())?,
        OutputFormat::Json => {
            let outcomes = ctx.outcomes(&packets);
            backends::json::generate(&ctx.table, &outcomes)? + "\n"
        }
    };
    write_output(opt.output.as_deref(), &output)
}

fn generate_ids(opt: &IdsOpt) -> Result<(), String> {
    let mut sources = SourceDatabase::new();
    let table = load_table(&mut sources, &opt.declarations, &opt.declaration_suffix)?;
    let id_type =
        IdType { name: opt.type_name.clone(), repr: opt.repr.clone(), suffix: opt.suffix.clone() };
    let code = backends::go::generate_ids(
        &opt.declarations.display().to_string(),
        &opt.package,
        &table,
        &id_type,
    );
    let code = formatter(opt.no_format, &opt.gofmt).format(code).map_err(|err| err.to_string())?;
    write_output(opt.output.as_deref(), &code)
}

fn main() -> Result<(), String> {
    let opt: Opt = argh::from_env();

    if opt.version {
        println!("pmportc {}\nCopyright (C) 2023 Google LLC", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing();

    match &opt.command {
        Some(Subcommand::Packets(opt)) => generate_packets(opt),
        Some(Subcommand::Ids(opt)) => generate_ids(opt),
        None => Err("No subcommand is specified, see --help".to_owned()),
    }
}

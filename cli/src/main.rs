use std::collections::HashMap;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use serde::{Deserialize, Serialize};

use procml::choice::{ChoiceRegistry, ChoiceSet};
use procml::compiler::{Compiler, IdLookup};
use procml::element::{Element, Node};
use procml::validate::StringRules;
use procml::Procedure;

#[derive(Parser)]
#[command(name = "procml", version, about = "Procedure markup compiler")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a document for parse errors
    Check(CheckArgs),

    /// Compile a document and dump the instruction program as JSON
    Compile(CompileArgs),

    /// List the procedures a document defines
    List(ListArgs),
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Markup source file
    file: String,
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Markup source file
    file: String,

    /// TOML file with [variables] and [locations] id tables
    #[arg(long)]
    ids: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct ListArgs {
    /// Markup source file
    file: String,
}

/// Name-to-id mappings read from the optional `--ids` TOML file.
#[derive(Deserialize, Default)]
#[serde(default)]
struct IdTables {
    variables: HashMap<String, i64>,
    locations: HashMap<String, i64>,
}

impl IdLookup for IdTables {
    fn variable_id(&self, name: &str) -> Option<i64> {
        self.variables.get(name).copied()
    }

    fn location_id(&self, name: &str) -> Option<i64> {
        self.locations.get(name).copied()
    }
}

#[derive(Serialize)]
struct Output {
    procedures: Vec<Procedure>,
    choice_sets: Vec<ChoiceSet>,
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Check(args) => do_check(args, cli.no_color),
        Command::Compile(args) => do_compile(args, cli.no_color),
        Command::List(args) => do_list(args, cli.no_color),
    }
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

/// Read and parse a source file, emitting accumulated parse errors as
/// diagnostics and exiting nonzero if any were found.
fn parse_file(file: &str, no_color: bool) -> Vec<Node> {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());

    let parser = procml::parser::Parser::new(source, file_id);
    match parser.parse() {
        Ok(nodes) => nodes,
        Err(errors) => {
            let writer = StandardStream::stderr(color_choice(no_color));
            let config = term::Config::default();
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    }
}

/// Top-level `proc` elements of a document; everything else is skipped.
fn top_level_procs(nodes: &[Node]) -> Vec<&Element> {
    nodes
        .iter()
        .filter_map(Node::as_element)
        .filter(|e| e.name == "proc")
        .collect()
}

fn load_ids(path: Option<&str>) -> IdTables {
    let Some(path) = path else {
        return IdTables::default();
    };
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path, e);
            process::exit(1);
        }
    };
    match toml::from_str(&raw) {
        Ok(tables) => tables,
        Err(e) => {
            eprintln!("error: invalid id table '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn do_check(args: CheckArgs, no_color: bool) {
    parse_file(&args.file, no_color);
    eprintln!("ok: {} parsed successfully", args.file);
}

fn do_compile(args: CompileArgs, no_color: bool) {
    let nodes = parse_file(&args.file, no_color);
    let ids = load_ids(args.ids.as_deref());

    let mut registry = ChoiceRegistry::new();
    let mut procedures = Vec::new();
    for element in top_level_procs(&nodes) {
        let id = match element.require_word("id", &StringRules::none()) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        };
        let commands = match Compiler::new(&ids, &mut registry).compile(element) {
            Ok(commands) => commands,
            Err(e) => {
                eprintln!("error in proc '{}': {}", id, e);
                process::exit(1);
            }
        };
        procedures.push(Procedure { id, commands });
    }

    let output = Output {
        procedures,
        choice_sets: registry.sets().to_vec(),
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn do_list(args: ListArgs, no_color: bool) {
    let nodes = parse_file(&args.file, no_color);
    for element in top_level_procs(&nodes) {
        match element.attr("id") {
            Some(id) => println!("{}", id),
            None => println!("(unnamed proc)"),
        }
    }
}

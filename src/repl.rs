// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive REPL that lowers each entry and prints its IR.
//!
//! Entries share one [`Frontend`], so functions declared earlier keep
//! their ids and lazy stubs can be compiled later with `.lazy`.

use crate::print_diagnostic;
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use spacey_frontend::{Frontend, FrontendConfig};
use std::borrow::Cow;
use std::path::PathBuf;

const HISTORY_FILE: &str = ".spacey_lower_history";
const MAX_HISTORY_SIZE: usize = 1000;

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "const", "continue", "debugger", "default", "delete", "do",
    "else", "finally", "for", "function", "if", "in", "instanceof", "let", "new", "return",
    "switch", "throw", "try", "typeof", "var", "void", "while",
];

const LITERALS: &[&str] = &["true", "false", "null", "undefined", "this", "arguments"];

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Module,
    Globals,
    Lazy,
    Load,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('.')?;
        let (cmd, arg) = match rest.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, Some(arg.trim())),
            None => (rest, None),
        };

        let command = match cmd.to_lowercase().as_str() {
            "help" | "h" | "?" => ReplCommand::Help,
            "exit" | "quit" | "q" => ReplCommand::Exit,
            "clear" | "cls" => ReplCommand::Clear,
            "module" | "ir" => ReplCommand::Module,
            "globals" | "g" => ReplCommand::Globals,
            "lazy" => ReplCommand::Lazy,
            "load" | "l" => ReplCommand::Load,
            _ => return None,
        };
        Some((command, arg))
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".module", "Print every function lowered so far"),
            (".globals", "List known global properties"),
            (".lazy [name]", "Lower deferred function bodies"),
            (".load <file>", "Compile a JavaScript file"),
        ]
    }
}

/// Completion, hints, highlighting and multi-line input for rustyline
struct LowerHelper {
    words: Vec<&'static str>,
}

impl LowerHelper {
    fn new() -> Self {
        let commands = ReplCommand::all_commands()
            .iter()
            .map(|&(usage, _)| usage.split(' ').next().unwrap_or(usage));
        let words = KEYWORDS
            .iter()
            .chain(LITERALS)
            .copied()
            .chain(commands)
            .collect();
        Self { words }
    }

    fn word_start(line: &str) -> usize {
        line.rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '.' && c != '$')
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

impl Completer for LowerHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[Self::word_start(&line[..pos])..pos];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let matches = self
            .words
            .iter()
            .filter(|candidate| candidate.starts_with(word))
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate[word.len()..].to_string(),
            })
            .collect();
        Ok((pos, matches))
    }
}

impl Hinter for LowerHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }
        let word = &line[Self::word_start(line)..];
        if word.len() < 2 {
            return None;
        }
        self.words
            .iter()
            .find(|candidate| candidate.starts_with(word) && candidate.len() > word.len())
            .map(|candidate| (&candidate[word.len()..]).dimmed().to_string())
    }
}

impl Highlighter for LowerHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.trim_start().starts_with('.') {
            return Cow::Owned(line.magenta().to_string());
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut word = String::new();
        for c in line.chars() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                continue;
            }
            result.push_str(&highlight_word(&word));
            word.clear();
            match c {
                '(' | ')' | '[' | ']' | '{' | '}' => result.push_str(&c.yellow().to_string()),
                '"' | '\'' => result.push_str(&c.green().to_string()),
                _ => result.push(c),
            }
        }
        result.push_str(&highlight_word(&word));
        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn highlight_word(word: &str) -> String {
    if KEYWORDS.contains(&word) {
        word.magenta().bold().to_string()
    } else if LITERALS.contains(&word) {
        word.blue().to_string()
    } else if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
        word.yellow().to_string()
    } else {
        word.to_string()
    }
}

impl Validator for LowerHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }
        let continues = input
            .trim_end()
            .ends_with(['\\', '+', '-', '*', '=', ',', '&', '|', '?', ':']);
        if continues {
            return Ok(ValidationResult::Incomplete);
        }
        Ok(ValidationResult::Valid(None))
    }
}

/// Returns false while a bracket or string opened in `input` is still open.
/// Mismatched closers count as balanced so the parser reports them.
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut quote = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(open) = quote {
            match c {
                '\\' => {
                    chars.next();
                }
                '\n' => quote = None,
                _ if c == open => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '/' if chars.peek() == Some(&'/') => {
                // Line comment
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' | '\'' => quote = Some(c),
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' if stack.pop() != Some(c) => return true,
            _ => {}
        }
    }

    stack.is_empty() && quote.is_none()
}

impl Helper for LowerHelper {}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

/// The interactive REPL
pub struct Repl {
    frontend: Frontend,
    editor: Editor<LowerHelper, DefaultHistory>,
    history_path: PathBuf,
    entries: usize,
}

impl Repl {
    /// Create a new REPL compiling with `config`
    pub fn new(config: FrontendConfig) -> rustyline::Result<Self> {
        let editor_config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(editor_config)?;
        editor.set_helper(Some(LowerHelper::new()));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spacey")
            .join(HISTORY_FILE);
        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.load_history(&history_path);

        Ok(Self {
            frontend: Frontend::new(config),
            editor,
            history_path,
            entries: 0,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "lower>".bright_green().bold());
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }
                    self.entries += 1;
                    let name = format!("<repl:{}>", self.entries);
                    self.compile_and_print(name, trimmed.to_string());
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        let _ = self.editor.save_history(&self.history_path);
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {} {}",
            "Spacey IR lowering".white().bold(),
            "v".dimmed(),
            env!("CARGO_PKG_VERSION").bright_yellow()
        );
        let config = self.frontend.config();
        println!(
            "  {} strict={} lazy={}",
            "config:".dimmed(),
            config.strict,
            config
                .lazy_threshold()
                .map_or_else(|| "off".to_string(), |bytes| format!("{bytes}B"))
        );
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => self.print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Module => print!("{}", self.frontend.module_to_string()),
            ReplCommand::Globals => self.print_globals(),
            ReplCommand::Lazy => self.compile_lazy(arg),
            ReplCommand::Load => match arg {
                Some(path) => self.load_file(path),
                None => eprintln!(
                    "{}: {} {}",
                    "Error".red().bold(),
                    ".load".cyan(),
                    "requires a file path".dimmed()
                ),
            },
        }
        CommandResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();
        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:16} {}", cmd.cyan(), desc.dimmed());
        }
        println!();
    }

    fn print_globals(&self) {
        let interner = self.frontend.interner();
        for global in self.frontend.module().globals() {
            let name = interner.resolve(global.name);
            if global.declared {
                println!("  {}", name.cyan());
            } else {
                println!("  {} {}", name, "(undeclared)".dimmed());
            }
        }
    }

    fn compile_lazy(&mut self, name: Option<&str>) {
        let diagnostics = self.frontend.diagnostics().len();
        let result = match name {
            Some(name) => match self.frontend.find_function(name) {
                Some(function) => self.frontend.compile_lazy(function).map(|()| 1),
                None => {
                    eprintln!("{}: no function named '{name}'", "Error".red().bold());
                    return;
                }
            },
            None => self.frontend.compile_all_lazy(),
        };
        self.print_new_diagnostics(diagnostics);
        match result {
            Ok(count) => println!("{} {count} lazy function(s)", "compiled".green()),
            Err(e) => print_diagnostic(&self.frontend.format_error(&e)),
        }
    }

    fn load_file(&mut self, path: &str) {
        match std::fs::read_to_string(path) {
            Ok(text) => self.compile_and_print(path.to_string(), text),
            Err(e) => eprintln!("{}: {}: {}", "Error".red().bold(), path.cyan(), e),
        }
    }

    /// Compiles one entry and prints the functions it added.
    fn compile_and_print(&mut self, name: String, text: String) {
        let functions = self.frontend.module().len();
        let diagnostics = self.frontend.diagnostics().len();

        let result = self.frontend.compile(name, text);
        self.print_new_diagnostics(diagnostics);
        if let Err(e) = result {
            if self.frontend.diagnostics().len() == diagnostics {
                print_diagnostic(&self.frontend.format_error(&e));
            }
            return;
        }

        let added: Vec<_> = self
            .frontend
            .module()
            .functions()
            .skip(functions)
            .map(|(id, _)| id)
            .collect();
        for function in added {
            print!("{}", self.frontend.function_to_string(function));
        }
    }

    fn print_new_diagnostics(&self, skip: usize) {
        for diagnostic in self.frontend.diagnostics().since(skip) {
            print_diagnostic(&self.frontend.format_diagnostic(diagnostic));
        }
    }
}

use std::io::{self, BufRead, Lines, StdinLock};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    history::DefaultHistory,
    Cmd, Context, Editor, Helper, Highlighter, Hinter, KeyEvent, Validator,
};

use super::commands::{LoopControl, ShellContext};
use super::output::info as output_info;
use super::{CliError, CliMode, SCRIPT_ENV_VAR};

const PROMPT: &str = "cashflow> ";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV_VAR).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    if mode == CliMode::Script {
        colored::control::set_override(false);
    }

    let mut context = ShellContext::new()?;
    let mut input = LineSource::open(mode, context.command_names())?;

    while let Some(line) = input.next_line()? {
        match execute(&mut context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => return Ok(()),
            Err(err) => context.report_error(err)?,
        }
    }
    if mode == CliMode::Interactive {
        output_info("Exiting shell.");
    }
    Ok(())
}

/// Tokenizes and dispatches one line. Blank lines and `#` comments do nothing.
fn execute(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    let tokens = shell_words::split(line).map_err(|err| CliError::Input(err.to_string()))?;
    match tokens.split_first() {
        None => Ok(LoopControl::Continue),
        Some((command, _)) if command.starts_with('#') => Ok(LoopControl::Continue),
        Some((command, args)) => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            context.dispatch(&command.to_lowercase(), &args)
        }
    }
}

enum LineSource {
    Editor(Box<Editor<CommandHelper, DefaultHistory>>),
    Script(Lines<StdinLock<'static>>),
}

impl LineSource {
    fn open(mode: CliMode, commands: Vec<&'static str>) -> Result<Self, CliError> {
        match mode {
            CliMode::Script => Ok(Self::Script(io::stdin().lock().lines())),
            CliMode::Interactive => {
                let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
                editor.set_helper(Some(CommandHelper { commands }));
                editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
                Ok(Self::Editor(Box::new(editor)))
            }
        }
    }

    /// `None` at end of input, or when the user presses Ctrl-C / Ctrl-D.
    fn next_line(&mut self) -> Result<Option<String>, CliError> {
        match self {
            Self::Script(lines) => Ok(lines.next().transpose()?),
            Self::Editor(editor) => match editor.readline(PROMPT) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        editor.add_history_entry(trimmed).ok();
                    }
                    Ok(Some(line))
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
                Err(err) => Err(err.into()),
            },
        }
    }
}

/// Completes the command word; arguments are left alone.
#[derive(Helper, Hinter, Highlighter, Validator)]
struct CommandHelper {
    commands: Vec<&'static str>,
}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        let word = typed.trim_start();
        if word.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let needle = word.to_ascii_lowercase();
        let candidates = self
            .commands
            .iter()
            .filter(|name| name.starts_with(&needle))
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();
        Ok((pos - word.len(), candidates))
    }
}

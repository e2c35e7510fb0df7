//! The interactive chat loop.
//!
//! Reads one line at a time. `quit`/`exit` (any case) and end of input end
//! the session; slash commands act on the session or dataset; anything else
//! is a question for the orchestrator.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use tracing::warn;

use biznavi_core::{Orchestrator, Session};
use biznavi_data::CsvDatasetProvider;

use crate::render::render_turn;

const PROMPT: &str = "you> ";

const HELP: &str = "\
Commands:
  /clear          forget the conversation so far
  /upload <csv>   replace the sales dataset with your own CSV file
  /reload         re-read the dataset files
  /source         show which dataset is in use
  /help           show this help
  quit, exit      leave";

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    Empty,
    Clear,
    Upload(Option<PathBuf>),
    Reload,
    Source,
    Help,
    Unknown(String),
    Query(String),
}

pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        return Input::Quit;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Query(line.to_string());
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));
    match name.to_ascii_lowercase().as_str() {
        "clear" => Input::Clear,
        "upload" => Input::Upload((!arg.is_empty()).then(|| PathBuf::from(arg.trim_matches('"')))),
        "reload" => Input::Reload,
        "source" => Input::Source,
        "help" => Input::Help,
        _ => Input::Unknown(name.to_string()),
    }
}

pub fn banner(source: &str) -> String {
    format!(
        "BizNavi: e-commerce operations assistant\n\
         ========================================\n\
         Using {source}.\n\
         \n\
         Try:\n\
         \x20 What was the total revenue for Kurta in April?\n\
         \x20 What is the net revenue for Kurta in April?\n\
         \x20 Forecast demand for Kurta for 30 days\n\
         \x20 Show a chart of Amount by Category\n\
         \x20 What is the allowed shrinkage limit?\n\
         \n\
         Type /help for commands, quit to leave."
    )
}

/// Run the loop until `quit`, `exit` or end of input.
pub fn run(
    orchestrator: &Orchestrator,
    session: &Session,
    provider: &CsvDatasetProvider,
    input: impl BufRead,
    mut out: impl Write,
) -> io::Result<()> {
    writeln!(out, "{}\n", banner(&provider.provenance().to_string()))?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            return Ok(());
        };

        match parse_line(&line?) {
            Input::Quit => return Ok(()),
            Input::Empty => {}
            Input::Clear => {
                session.clear_history();
                writeln!(out, "Conversation cleared.")?;
            }
            Input::Upload(None) => writeln!(out, "Usage: /upload <path to csv>")?,
            Input::Upload(Some(path)) => match provider.replace_with_upload(&path) {
                Ok(provenance) => writeln!(out, "Now using {provenance}.")?,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "upload rejected");
                    writeln!(out, "Upload failed: {e}")?;
                }
            },
            Input::Reload => {
                orchestrator.reload_dataset();
                writeln!(out, "Dataset will be re-read on the next question.")?;
            }
            Input::Source => writeln!(out, "Using {}.", provider.provenance())?,
            Input::Help => writeln!(out, "{HELP}")?,
            Input::Unknown(name) => writeln!(out, "Unknown command '/{name}'. Type /help.")?,
            Input::Query(query) => {
                let turn = orchestrator.respond(session, &query);
                writeln!(out, "\n{}\n", render_turn(&turn))?;
            }
        }
    }
}

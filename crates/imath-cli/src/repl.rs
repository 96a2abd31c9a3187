#![forbid(unsafe_code)]

//! `imath repl`: one live session per input line.
//!
//! After every line the REPL prints each session whose displayed result
//! changed, so a redefinition shows its whole ripple at once.
//!
//! Commands: `:vars`, `:drop N`, `:quit`.

use std::io::{BufRead, Write};
use std::rc::Rc;

use imath_runtime::{EvaluationSession, MathStorage, ResultCell, format_result};
use tracing::debug;

use crate::error::{CliError, Result};

struct Entry {
    latex: String,
    session: EvaluationSession,
    cell: ResultCell,
    shown: Option<String>,
}

/// Live sessions, numbered from 1 in input order.
pub struct Repl {
    storage: Rc<MathStorage>,
    entries: Vec<Option<Entry>>,
}

/// What the caller should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl Repl {
    #[must_use]
    pub fn new() -> Self {
        Self::with_storage(Rc::new(MathStorage::new()))
    }

    #[must_use]
    pub fn with_storage(storage: Rc<MathStorage>) -> Self {
        Self {
            storage,
            entries: Vec::new(),
        }
    }

    /// Handle one input line, writing any output to `out`.
    pub fn line(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let line = line.trim();
        match line.split_once(char::is_whitespace).unwrap_or((line, "")) {
            ("", _) => {}
            (":quit" | ":q", _) => return Ok(Flow::Quit),
            (":vars", _) => self.print_variables(out)?,
            (":drop", arg) => match self.drop_entry(arg.trim(), out) {
                Err(err @ CliError::InvalidArgument { .. }) => writeln!(out, "{err}")?,
                other => other?,
            },
            (command, _) if command.starts_with(':') => {
                writeln!(out, "unknown command {command}")?;
            }
            _ => {
                self.push(line);
                self.print_changes(out)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn push(&mut self, latex: &str) {
        let cell = ResultCell::new();
        let session = EvaluationSession::new(latex, cell.clone(), true, &self.storage);
        debug!(message = "repl.session", index = self.entries.len() + 1, latex);
        self.entries.push(Some(Entry {
            latex: latex.to_string(),
            session,
            cell,
            shown: None,
        }));
    }

    fn print_changes(&mut self, out: &mut impl Write) -> Result<()> {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let Some(entry) = entry else {
                continue;
            };
            let text = entry.cell.text();
            if entry.shown.as_deref() != Some(text.as_str()) {
                writeln!(out, "[{}] {} {}", index + 1, entry.latex, text)?;
                entry.shown = Some(text);
            }
        }
        Ok(())
    }

    fn print_variables(&self, out: &mut impl Write) -> Result<()> {
        for (id, variable) in self.storage.variables() {
            let mut aliases = variable.aliases;
            aliases.dedup();
            writeln!(
                out,
                "{} {} ({id})",
                aliases.join(", "),
                format_result(Some(variable.value))
            )?;
        }
        Ok(())
    }

    /// A non-numeric argument is an [`CliError::InvalidArgument`]; the
    /// REPL reports it and keeps reading.
    fn drop_entry(&mut self, arg: &str, out: &mut impl Write) -> Result<()> {
        let number: usize = arg.parse().map_err(|_| {
            CliError::invalid(format!(":drop expects a session number, got {arg:?}"))
        })?;
        let slot = number
            .checked_sub(1)
            .and_then(|i| self.entries.get_mut(i));
        match slot.and_then(Option::take) {
            Some(entry) => {
                entry.session.dispose();
                writeln!(out, "dropped [{arg}] {}", entry.latex)?;
            }
            None => writeln!(out, "no session {arg}")?,
        }
        Ok(())
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the REPL until `:quit` or end of input.
pub fn run_repl(input: impl BufRead, out: &mut impl Write) -> Result<()> {
    let mut repl = Repl::new();
    for line in input.lines() {
        if repl.line(&line?, out)? == Flow::Quit {
            break;
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use imath_runtime::SequentialIdGenerator;

    fn transcript(lines: &[&str]) -> String {
        let storage = Rc::new(MathStorage::with_id_generator(SequentialIdGenerator::new()));
        let mut repl = Repl::with_storage(storage);
        let mut out = Vec::new();
        for line in lines {
            if repl.line(line, &mut out).unwrap() == Flow::Quit {
                break;
            }
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn redefinition_prints_every_changed_result() {
        let out = transcript(&["a := 2", "b := a * 3", "a + b", "a := 4"]);
        assert_eq!(
            out,
            "[1] a := 2 =2\n\
             [2] b := a * 3 =6\n\
             [3] a + b =8\n\
             [2] b := a * 3 =12\n\
             [3] a + b =16\n\
             [4] a := 4 =4\n"
        );
    }

    #[test]
    fn dropped_sessions_stop_updating() {
        let out = transcript(&["a := 1", "a + 1", ":drop 2", "a := 5", ":drop 2", ":drop 0"]);
        assert_eq!(
            out,
            "[1] a := 1 =1\n\
             [2] a + 1 =2\n\
             dropped [2] a + 1\n\
             [3] a := 5 =5\n\
             no session 2\n\
             no session 0\n"
        );
    }

    #[test]
    fn bad_drop_argument_is_reported_and_reading_continues() {
        let out = transcript(&[":drop x", ":drop", "2*2"]);
        assert_eq!(
            out,
            "invalid argument: :drop expects a session number, got \"x\"\n\
             invalid argument: :drop expects a session number, got \"\"\n\
             [1] 2*2 =4\n"
        );
    }

    #[test]
    fn vars_lists_aliases_and_values() {
        let out = transcript(&["x_1 := 7", ":vars"]);
        assert_eq!(out, "[1] x_1 := 7 =7\nx_{1}, x_1 =7 (Va)\n");
    }

    #[test]
    fn quit_stops_reading() {
        let out = transcript(&["1+1", ":quit", "2+2"]);
        assert_eq!(out, "[1] 1+1 =2\n");
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(transcript(&[":nope"]), "unknown command :nope\n");
    }

    #[test]
    fn run_repl_reads_until_eof() {
        let mut out = Vec::new();
        run_repl("3*3\n\n".as_bytes(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[1] 3*3 =9\n");
    }
}

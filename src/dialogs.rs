//! Terminal stand-ins for the browser's confirm and alert dialogs

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use tracing::warn;
use zoneforge_editor::Dialogs;

/// Prompts on stderr, reads answers from stdin, prints alerts to stdout
pub struct TerminalDialogs {
    assume_yes: bool,
    input: RefCell<Box<dyn BufRead>>,
    prompts: RefCell<Box<dyn Write>>,
}

impl TerminalDialogs {
    pub fn new(assume_yes: bool) -> Self {
        Self::with_input(assume_yes, io::BufReader::new(io::stdin()))
    }

    pub fn with_input(assume_yes: bool, input: impl BufRead + 'static) -> Self {
        Self::with_io(assume_yes, input, io::stderr())
    }

    pub fn with_io(assume_yes: bool, input: impl BufRead + 'static, prompts: impl Write + 'static) -> Self {
        Self {
            assume_yes,
            input: RefCell::new(Box::new(input)),
            prompts: RefCell::new(Box::new(prompts)),
        }
    }

    /// Show a prompt; an unwritable terminal is logged, the answer is still read
    fn prompt(&self, text: &str) {
        let mut prompts = self.prompts.borrow_mut();
        if let Err(err) = prompts.write_all(text.as_bytes()).and_then(|()| prompts.flush()) {
            warn!(error = %err, "could not show confirmation prompt");
        }
    }

    fn read_answer(&self) -> Option<String> {
        let mut line = String::new();
        match self.input.borrow_mut().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(err) => {
                warn!(error = %err, "could not read confirmation");
                None
            }
        }
    }
}

impl Dialogs for TerminalDialogs {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            self.prompt(&format!("{} [y/N] y\n", message));
            return true;
        }

        self.prompt(&format!("{} [y/N] ", message));

        self.read_answer()
            .map(|answer| is_yes(&answer))
            .unwrap_or(false)
    }

    fn alert(&self, message: &str) {
        println!("{}", message.trim_end());
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_confirm_reads_answers() {
        let dialogs = TerminalDialogs::with_input(false, Cursor::new("yes\nn\n\n"));
        assert!(dialogs.confirm("Delete?"));
        assert!(!dialogs.confirm("Delete?"));
        assert!(!dialogs.confirm("Delete?"));
        // end of input declines
        assert!(!dialogs.confirm("Delete?"));
    }

    #[test]
    fn test_assume_yes_never_reads() {
        let dialogs = TerminalDialogs::with_input(true, Cursor::new("n\n"));
        assert!(dialogs.confirm("Reload to load new record?"));
        assert_eq!(dialogs.read_answer().as_deref(), Some("n\n"));
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_unwritable_prompt_still_reads_answer() {
        let dialogs = TerminalDialogs::with_io(false, Cursor::new("y\n"), Closed);
        assert!(dialogs.confirm("Delete?"));

        let dialogs = TerminalDialogs::with_io(true, Cursor::new(""), Closed);
        assert!(dialogs.confirm("Delete?"));
    }

    #[test]
    fn test_prompt_text() {
        let shared = std::rc::Rc::new(RefCell::new(Vec::new()));
        struct Sink(std::rc::Rc<RefCell<Vec<u8>>>);
        impl Write for Sink {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.borrow_mut().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let dialogs = TerminalDialogs::with_io(false, Cursor::new("n\n"), Sink(shared.clone()));
        assert!(!dialogs.confirm("Delete?"));
        assert_eq!(String::from_utf8(shared.borrow().clone()).unwrap(), "Delete? [y/N] ");
    }
}

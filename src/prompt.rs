use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Blocking text prompt. `None` means the user dismissed it.
pub trait Prompt: Send {
    fn ask(&mut self, message: &str) -> Option<String>;
}

/// Answers queued up front; dismisses once they run out.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Option<String>>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(|answer| answer.map(Into::into)).collect(),
            asked: Vec::new(),
        }
    }

    pub fn dismissing() -> Self {
        Self::default()
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        self.asked.push(message.to_string());
        self.answers.pop_front().flatten()
    }
}

/// Reads one line from stdin; end of input counts as dismissal.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{message} ");
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_run_out_as_dismissals() {
        let mut prompt = ScriptedPrompt::new([Some("500"), None]);
        assert_eq!(prompt.ask("amount?").as_deref(), Some("500"));
        assert_eq!(prompt.ask("amount?"), None);
        assert_eq!(prompt.ask("amount?"), None);
        assert_eq!(prompt.asked().len(), 3);
    }
}

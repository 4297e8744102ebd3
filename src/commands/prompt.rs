//! Terminal prompts
//!
//! Everything that talks to the user goes through [`Prompter`] so the sync
//! command can be driven by a script in tests.

use dialoguer::console::Term;
use dialoguer::{Confirm, Input};

use crate::core::models::{AppError, AppResult};

pub trait Prompter {
    /// Yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> AppResult<bool>;

    /// Free text answer, may be empty
    fn input(&mut self, question: &str) -> AppResult<String>;

    /// Block until the user acknowledges
    fn pause(&mut self, message: &str) -> AppResult<()>;
}

/// Prompts on stderr through `dialoguer`
#[derive(Debug, Clone)]
pub struct TerminalPrompter {
    term: Term,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

fn prompt_error(e: dialoguer::Error) -> AppError {
    AppError::Prompt(e.to_string())
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> AppResult<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact_on(&self.term)
            .map_err(prompt_error)
    }

    fn input(&mut self, question: &str) -> AppResult<String> {
        Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text_on(&self.term)
            .map_err(prompt_error)
    }

    fn pause(&mut self, message: &str) -> AppResult<()> {
        self.term.write_line(message)?;
        self.term.read_line()?;
        Ok(())
    }
}

/// Replays canned answers, for tests and scripted runs
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirms: Vec<bool>,
    inputs: Vec<String>,
    pub pauses: usize,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(confirms: Vec<bool>, inputs: Vec<&str>) -> Self {
        Self {
            confirms: confirms.into_iter().rev().collect(),
            inputs: inputs.into_iter().rev().map(str::to_string).collect(),
            ..Self::default()
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str, _default: bool) -> AppResult<bool> {
        self.asked.push(question.to_string());
        self.confirms
            .pop()
            .ok_or_else(|| AppError::Prompt(format!("no scripted answer for '{}'", question)))
    }

    fn input(&mut self, question: &str) -> AppResult<String> {
        self.asked.push(question.to_string());
        self.inputs
            .pop()
            .ok_or_else(|| AppError::Prompt(format!("no scripted answer for '{}'", question)))
    }

    fn pause(&mut self, _message: &str) -> AppResult<()> {
        self.pauses += 1;
        Ok(())
    }
}

//! Interactive questions asked by `init`.

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};

/// Source of answers to the init questions.
pub trait Prompter {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;

    /// Index of the chosen item.
    fn select(&mut self, message: &str, items: &[String], default: usize) -> Result<usize>;

    /// Free text, re-asked until `validate` accepts it.
    fn input(
        &mut self,
        message: &str,
        default: Option<&str>,
        validate: &dyn Fn(&str) -> Result<(), String>,
    ) -> Result<String>;
}

/// Asks on the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()?)
    }

    fn select(&mut self, message: &str, items: &[String], default: usize) -> Result<usize> {
        Ok(Select::new()
            .with_prompt(message)
            .items(items)
            .default(default)
            .interact()?)
    }

    fn input(
        &mut self,
        message: &str,
        default: Option<&str>,
        validate: &dyn Fn(&str) -> Result<(), String>,
    ) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(message);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input
            .validate_with(|value: &String| validate(value))
            .interact_text()?)
    }
}

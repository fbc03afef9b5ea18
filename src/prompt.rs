use std::io::Write;

use anyhow::{bail, Result};

pub type Validator<'a> = &'a dyn Fn(&str) -> Result<(), String>;

/// Accepts any input; for prompts whose constraints live in the caller.
pub fn any(_: &str) -> Result<(), String> {
    Ok(())
}

pub fn non_empty(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        Err("Cannot be empty".into())
    } else {
        Ok(())
    }
}

/// Operator input seam. Rendering is an implementation detail; the workflow
/// only states what is asked and which constraints apply.
pub trait Prompter {
    /// Asks until `validate` accepts the answer. An empty answer takes the
    /// default when one is given.
    fn text(&mut self, message: &str, default: Option<&str>, validate: Validator) -> Result<String>;

    fn select(&mut self, message: &str, choices: &[String]) -> Result<String>;

    fn multi_select(&mut self, message: &str, choices: &[String]) -> Result<Vec<String>>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;

    fn password(&mut self, message: &str) -> Result<String>;
}

/// Line-oriented terminal prompter. Secrets go through rpassword so they
/// are never echoed.
pub struct TermPrompter;

impl TermPrompter {
    fn read_line(&self) -> Result<String> {
        let mut line = String::new();
        let n = std::io::stdin().read_line(&mut line)?;
        if n == 0 {
            bail!("Aborted: end of input");
        }
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    fn ask(&self, message: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(def) => print!("{} [{}]: ", message, def),
            None => print!("{}: ", message),
        }
        std::io::stdout().flush()?;
        let answer = self.read_line()?;
        if answer.is_empty() {
            if let Some(def) = default {
                return Ok(def.to_string());
            }
        }
        Ok(answer)
    }
}

impl Prompter for TermPrompter {
    fn text(&mut self, message: &str, default: Option<&str>, validate: Validator) -> Result<String> {
        loop {
            let answer = self.ask(message, default)?;
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(msg) => eprintln!("{}", msg),
            }
        }
    }

    fn select(&mut self, message: &str, choices: &[String]) -> Result<String> {
        println!("{}", message);
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}) {}", i + 1, choice);
        }
        loop {
            let answer = self.ask("Choice", None)?;
            match answer.parse::<usize>() {
                Ok(n) if n >= 1 && n <= choices.len() => return Ok(choices[n - 1].clone()),
                _ => eprintln!("Enter a number between 1 and {}", choices.len()),
            }
        }
    }

    fn multi_select(&mut self, message: &str, choices: &[String]) -> Result<Vec<String>> {
        println!("{}", message);
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}) {}", i + 1, choice);
        }
        loop {
            let answer = self.ask("Choices (comma-separated, empty for none)", None)?;
            if answer.trim().is_empty() {
                return Ok(vec![]);
            }
            let picks: Option<Vec<usize>> = answer
                .split(',')
                .map(|part| match part.trim().parse::<usize>() {
                    Ok(n) if n >= 1 && n <= choices.len() => Some(n - 1),
                    _ => None,
                })
                .collect();
            match picks {
                Some(idx) => return Ok(idx.into_iter().map(|i| choices[i].clone()).collect()),
                None => eprintln!("Enter numbers between 1 and {}", choices.len()),
            }
        }
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self.ask(&format!("{} ({})", message, hint), None)?;
            match answer.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => eprintln!("Answer y or n"),
            }
        }
    }

    fn password(&mut self, message: &str) -> Result<String> {
        Ok(rpassword::prompt_password(format!("{}: ", message))?)
    }
}

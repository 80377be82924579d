//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, BufRead, Write};

use crate::domain::change::Category;
use crate::domain::version::Increment;
use crate::error::{ChangehelperError, Result};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_commit_analysis, display_error, display_release_refs,
    display_status, display_success, display_version_change,
};

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Accepts "y" or "yes" (case-insensitive) as confirmation; the default is "no".
pub fn confirm_action(prompt: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_with(&mut stdin.lock(), &mut io::stdout(), prompt)
}

/// [`confirm_action`] over arbitrary input and output streams.
pub fn confirm_with<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<bool> {
    write!(output, "\n{} (y/N): ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// Asks for additional entries of one category, one per line.
///
/// An empty line ends the list. Leading `- ` markers are removed.
pub fn prompt_entries(category: Category) -> Result<Vec<String>> {
    let stdin = io::stdin();
    prompt_entries_with(&mut stdin.lock(), &mut io::stdout(), category)
}

/// [`prompt_entries`] over arbitrary input and output streams.
pub fn prompt_entries_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    category: Category,
) -> Result<Vec<String>> {
    writeln!(output, "\n{} entries (empty line to finish):", category)?;

    let mut entries = Vec::new();
    loop {
        write!(output, "  - ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let entry = line.trim();
        let entry = entry.strip_prefix("- ").unwrap_or(entry).trim();
        if entry.is_empty() {
            break;
        }
        entries.push(entry.to_string());
    }
    Ok(entries)
}

/// Asks for the increment of the pending release.
///
/// Pressing Enter keeps `suggested`, which may be no increment at all.
pub fn prompt_increment(suggested: Option<Increment>) -> Result<Option<Increment>> {
    let stdin = io::stdin();
    prompt_increment_with(&mut stdin.lock(), &mut io::stdout(), suggested)
}

/// [`prompt_increment`] over arbitrary input and output streams.
pub fn prompt_increment_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    suggested: Option<Increment>,
) -> Result<Option<Increment>> {
    match suggested {
        Some(increment) => write!(output, "\nIncrement (MAJOR/MINOR/PATCH) [{}]: ", increment)?,
        None => write!(output, "\nIncrement (MAJOR/MINOR/PATCH) [none]: ")?,
    }
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();

    if answer.is_empty() {
        return Ok(suggested);
    }
    answer
        .parse::<Increment>()
        .map(Some)
        .map_err(|e| ChangehelperError::prompt(e.to_string()))
}

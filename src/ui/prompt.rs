//! Interactive prompts (dialoguer)

use crate::types::MenuItem;
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};

/// Ask for the access code; `None` when the user cancels
pub fn prompt_code() -> Option<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Access code")
        .allow_empty_password(true)
        .interact()
        .ok()
}

/// Ask for a video link; empty string means "quit"
pub fn prompt_url(initial: &str) -> Option<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Paste video link (:logout, empty to quit)")
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
        .ok()
        .map(|s| s.trim().to_string())
}

/// Pick one item; `None` on escape or empty list
pub fn select<T: Clone>(items: &[MenuItem<T>], prompt: &str) -> Option<T> {
    if items.is_empty() {
        return None;
    }

    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()
        .ok()
        .flatten()?;

    items.get(selection).map(|item| item.value.clone())
}

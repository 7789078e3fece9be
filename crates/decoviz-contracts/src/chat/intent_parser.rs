use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, NO_ARG_COMMANDS, OPTIONAL_PATH_COMMANDS, SELECT_COMMAND, TEXT_ARG_COMMANDS,
    UPLOAD_COMMAND,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            command_args: BTreeMap::new(),
        }
    }

    fn with_arg(mut self, key: &str, value: Value) -> Self {
        self.command_args.insert(key.to_string(), value);
        self
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.command_args
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn split_words(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = split_words(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

/// `/upload <path> [instructions...]`: the first shell word is the path, the
/// rest of the line is the optional instruction.
fn parse_upload_args(arg: &str) -> (String, String) {
    let mut parts = split_words(arg).into_iter();
    let path = parts.next().unwrap_or_default();
    let instructions = parts.collect::<Vec<String>>().join(" ");
    (path, instructions)
}

/// The 1-based index typed by the user, as a 0-based index.
fn parse_index_arg(arg: &str) -> Value {
    match arg.trim().parse::<u64>() {
        Ok(value) if value > 0 => Value::Number((value - 1).into()),
        _ => Value::Null,
    }
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let remainder = &slash_tail[command_len..];
            let arg = remainder.trim();

            if command == UPLOAD_COMMAND.command {
                let (path, instructions) = parse_upload_args(arg);
                return Intent::new(UPLOAD_COMMAND.action, text)
                    .with_arg("path", Value::String(path))
                    .with_arg("instructions", Value::String(instructions));
            }

            if command == SELECT_COMMAND.command {
                return Intent::new(SELECT_COMMAND.action, text)
                    .with_arg("index", parse_index_arg(arg));
            }

            if let Some((spec, key)) = TEXT_ARG_COMMANDS
                .iter()
                .find(|(spec, _)| spec.command == command)
            {
                return Intent::new(spec.action, text)
                    .with_arg(key, Value::String(arg.to_string()));
            }

            if let Some(action) = find_action(&command, OPTIONAL_PATH_COMMANDS) {
                return Intent::new(action, text)
                    .with_arg("path", Value::String(parse_single_path_arg(arg)));
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            return Intent::new("unknown", text)
                .with_arg("command", Value::String(command))
                .with_arg("arg", Value::String(arg.to_string()));
        }
    }

    Intent::new("refine", text).with_arg("instructions", Value::String(raw_trimmed.to_string()))
}

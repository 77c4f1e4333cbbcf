//! Parsing `workspace/executeCommand` requests.

use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::{ExecuteCommandParams, Url};

use shlint_core::suppress::normalize_rule_id;

pub const RUN_LINT: &str = "shlint.runLint";
pub const DISABLE_CHECK_FOR_LINE: &str = "shlint.disableCheckForLine";
pub const OPEN_RULE_DOC: &str = "shlint.openRuleDoc";
pub const RESET_VERSION_CHECK: &str = "shlint.resetVersionCheck";

/// Every command the server advertises.
pub const COMMANDS: &[&str] = &[
    RUN_LINT,
    DISABLE_CHECK_FOR_LINE,
    OPEN_RULE_DOC,
    RESET_VERSION_CHECK,
];

/// A decoded server command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Lint one document, or every open one.
    RunLint { uri: Option<Url> },
    DisableCheckForLine { uri: Url, line: u32, rule_id: String },
    OpenRuleDoc { rule_id: String },
    ResetVersionCheck,
}

pub fn parse_command(params: ExecuteCommandParams) -> Result<Command> {
    let args = params.arguments;
    match params.command.as_str() {
        RUN_LINT => Ok(Command::RunLint {
            uri: args.first().map(parse_uri).transpose()?,
        }),
        DISABLE_CHECK_FOR_LINE => {
            let [uri, line, rule] = args.as_slice() else {
                return Err(Error::invalid_params(
                    "expected arguments [uri, line, rule]",
                ));
            };
            let line = line
                .as_u64()
                .and_then(|l| u32::try_from(l).ok())
                .ok_or_else(|| Error::invalid_params("line must be a non-negative integer"))?;
            Ok(Command::DisableCheckForLine {
                uri: parse_uri(uri)?,
                line,
                rule_id: parse_rule(rule)?,
            })
        }
        OPEN_RULE_DOC => {
            let rule = args
                .first()
                .ok_or_else(|| Error::invalid_params("expected argument [rule]"))?;
            Ok(Command::OpenRuleDoc {
                rule_id: parse_rule(rule)?,
            })
        }
        RESET_VERSION_CHECK => Ok(Command::ResetVersionCheck),
        other => Err(Error::invalid_params(format!("unknown command: {}", other))),
    }
}

fn parse_uri(value: &Value) -> Result<Url> {
    value
        .as_str()
        .and_then(|s| Url::parse(s).ok())
        .ok_or_else(|| Error::invalid_params(format!("invalid document uri: {}", value)))
}

fn parse_rule(value: &Value) -> Result<String> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(Error::invalid_params(format!("invalid rule: {}", value))),
    };
    let rule_id = normalize_rule_id(&raw);
    let digits = &rule_id[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::invalid_params(format!("invalid rule: {}", raw)));
    }
    Ok(rule_id)
}

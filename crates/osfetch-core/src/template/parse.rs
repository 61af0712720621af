//! Tokenizer and parser for `{{ .Field }}` / `{{ if .Field }}...{{ end }}` templates.

use super::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Parsed template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    /// Field reference without the leading dot, e.g. `OS.Name`.
    Field(String),
    /// Body rendered only when the field is non-empty.
    If { field: String, body: Vec<Node> },
}

/// One `{{ ... }}` action after trimming.
enum Action<'a> {
    Field(&'a str),
    If(&'a str),
    End,
}

fn parse_field_ref(text: &str, offset: usize) -> Result<&str, TemplateError> {
    let name = text.strip_prefix('.').ok_or_else(|| TemplateError::Syntax {
        offset,
        message: format!("expected field reference starting with '.', found {:?}", text),
    })?;
    if name.is_empty()
        || name
            .split('.')
            .any(|part| part.is_empty() || !part.chars().all(|c| c.is_alphanumeric() || c == '_'))
    {
        return Err(TemplateError::Syntax {
            offset,
            message: format!("malformed field reference {:?}", text),
        });
    }
    Ok(name)
}

fn parse_action(inner: &str, offset: usize) -> Result<Action<'_>, TemplateError> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Err(TemplateError::Syntax {
            offset,
            message: "empty action".to_string(),
        });
    }
    if inner == "end" {
        return Ok(Action::End);
    }
    if let Some(rest) = inner.strip_prefix("if") {
        if rest.starts_with(char::is_whitespace) {
            return Ok(Action::If(parse_field_ref(rest.trim(), offset)?));
        }
    }
    if inner.starts_with('.') {
        return Ok(Action::Field(parse_field_ref(inner, offset)?));
    }
    Err(TemplateError::Syntax {
        offset,
        message: format!("unknown action {:?}", inner),
    })
}

/// Parses `source` into a node tree. Field names are not checked here.
pub(crate) fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    // Stack of open `if` blocks: (field, offset, nodes collected before the block).
    let mut stack: Vec<(String, usize, Vec<Node>)> = Vec::new();
    let mut nodes: Vec<Node> = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        let Some(open) = rest.find(OPEN) else {
            nodes.push(Node::Text(rest.to_string()));
            break;
        };
        if open > 0 {
            nodes.push(Node::Text(rest[..open].to_string()));
        }
        let action_start = pos + open;
        let after_open = action_start + OPEN.len();
        let close = source[after_open..]
            .find(CLOSE)
            .ok_or_else(|| TemplateError::Syntax {
                offset: action_start,
                message: "unterminated action".to_string(),
            })?;
        let inner = &source[after_open..after_open + close];
        pos = after_open + close + CLOSE.len();

        match parse_action(inner, action_start)? {
            Action::Field(name) => nodes.push(Node::Field(name.to_string())),
            Action::If(name) => {
                let outer = std::mem::take(&mut nodes);
                stack.push((name.to_string(), action_start, outer));
            }
            Action::End => {
                let (field, _, outer) = stack.pop().ok_or_else(|| TemplateError::Syntax {
                    offset: action_start,
                    message: "unexpected {{end}}".to_string(),
                })?;
                let body = std::mem::replace(&mut nodes, outer);
                nodes.push(Node::If { field, body });
            }
        }
    }

    if let Some((_, offset, _)) = stack.pop() {
        return Err(TemplateError::Syntax {
            offset,
            message: "{{if}} without matching {{end}}".to_string(),
        });
    }
    Ok(nodes)
}

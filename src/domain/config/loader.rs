//! Loading of commented-JSON documents. Config and profile files are
//! plain JSON with `//` and `/* */` comments allowed, so users can
//! toggle settings by commenting them out. Stripping the comments
//! yields strict JSON.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::domain::error::AppError;

/// Remove `//` line comments and `/* */` block comments outside of
/// string literals. Newlines are preserved so parse errors still point
/// at the right line of the original file. Comment markers inside
/// strings (e.g. `https://...`) are left alone.
pub fn strip_comments(source: &str) -> String {
    enum State {
        Code,
        Str,
        StrEscape,
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '"' => {
                    out.push(c);
                    state = State::Str;
                }
                '/' => match chars.peek() {
                    Some('/') => {
                        chars.next();
                        state = State::LineComment;
                    }
                    Some('*') => {
                        chars.next();
                        state = State::BlockComment;
                    }
                    _ => out.push(c),
                },
                _ => out.push(c),
            },
            State::Str => match c {
                '\\' => {
                    out.push(c);
                    state = State::StrEscape;
                }
                '"' => {
                    out.push(c);
                    state = State::Code;
                }
                _ => out.push(c),
            },
            State::StrEscape => {
                out.push(c);
                state = State::Str;
            }
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '\n' {
                    out.push(c);
                } else if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }

    out
}

/// Expand a leading `~/` to the current user's home directory. Paths
/// without the tilde prefix pass through untouched.
pub fn expand_user(path: &str) -> String {
    let Some(home) = dirs::home_dir() else {
        return path.to_string();
    };
    if path == "~" {
        home.display().to_string()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest).display().to_string()
    } else {
        path.to_string()
    }
}

/// Strip comments from `raw` and parse the result as a JSON object.
/// On a parse failure the stripped text is saved to `diagnostic` so
/// the user can inspect what the parser actually saw.
pub fn load_document(
    raw: &str,
    origin: &Path,
    diagnostic: &Path,
) -> Result<Map<String, Value>, AppError> {
    let stripped = strip_comments(raw);
    match serde_json::from_str::<Map<String, Value>>(&stripped) {
        Ok(map) => Ok(map),
        Err(err) => {
            if let Some(parent) = diagnostic.parent() {
                let _ = fs::create_dir_all(parent);
            }
            let _ = fs::write(diagnostic, &stripped);
            Err(AppError::MalformedConfig {
                path: origin.display().to_string(),
                details: err.to_string(),
                diagnostic: diagnostic.display().to_string(),
            })
        }
    }
}

/// Load a user configuration file. `tools_path` and `iso_dir` accept
/// `~/` shorthand and are expanded here, right after parsing.
pub fn load_config(
    raw: &str,
    origin: &Path,
    diagnostic: &Path,
) -> Result<Map<String, Value>, AppError> {
    let mut config = load_document(raw, origin, diagnostic)?;

    for key in ["tools_path", "iso_dir"] {
        if let Some(Value::String(path)) = config.get(key) {
            let expanded = expand_user(path);
            config.insert(key.to_string(), Value::String(expanded));
        }
    }

    Ok(config)
}

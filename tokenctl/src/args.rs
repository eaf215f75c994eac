//! Command line parsing.

use error::AppError;
use serde_json::Value;
use token_auth::{Claims, KeyKind};

/// A parsed `tokenctl` invocation.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Sign a new token
    Issue {
        kind: KeyKind,
        hours: Option<i64>,
        claims: Claims,
    },
    /// Print the claims of a valid token
    Claims { kind: KeyKind, token: String },
    /// Print 200 / 401 / 423 for a token
    Validate { kind: KeyKind, token: String },
    /// Check a token against the global key
    Microservice { token: String },
    Help,
}

impl Command {
    /// Parse `args` as returned by `std::env::args()` (program name first).
    pub fn parse(args: &[String]) -> error::Result<Self> {
        let Some(name) = args.get(1) else {
            return Ok(Command::Help);
        };

        let mut kind = KeyKind::Access;
        let mut hours = None;
        let mut positional = Vec::new();

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--key" | "-k" => {
                    i += 1;
                    kind = value_of(args, i, "--key")?.parse()?;
                }
                "--hours" => {
                    i += 1;
                    let raw = value_of(args, i, "--hours")?;
                    hours = Some(raw.parse().map_err(|_| {
                        AppError::Validation(format!("--hours expects an integer, got '{}'", raw))
                    })?);
                }
                "--help" | "-h" => return Ok(Command::Help),
                other => positional.push(other.to_string()),
            }
            i += 1;
        }

        match name.as_str() {
            "issue" => Ok(Command::Issue {
                kind,
                hours,
                claims: positional
                    .iter()
                    .map(|pair| parse_claim(pair))
                    .collect::<error::Result<Claims>>()?,
            }),
            "claims" => Ok(Command::Claims {
                kind,
                token: single_token(positional)?,
            }),
            "validate" => Ok(Command::Validate {
                kind,
                token: single_token(positional)?,
            }),
            "microservice" => Ok(Command::Microservice {
                token: single_token(positional)?,
            }),
            "--help" | "-h" | "help" => Ok(Command::Help),
            other => Err(AppError::Validation(format!("unknown command '{}'", other))),
        }
    }
}

/// Parse `name=value`. The value is read as JSON when it parses, otherwise
/// it is kept as a string.
pub fn parse_claim(pair: &str) -> error::Result<(String, Value)> {
    let (name, raw) = pair
        .split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| AppError::Validation(format!("expected name=value, got '{}'", pair)))?;

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> error::Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| AppError::Validation(format!("{} requires a value", flag)))
}

fn single_token(mut positional: Vec<String>) -> error::Result<String> {
    match positional.len() {
        1 => Ok(positional.remove(0)),
        0 => Err(AppError::Validation("a token is required".to_string())),
        n => Err(AppError::Validation(format!("expected one token, got {}", n))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("tokenctl")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_no_arguments_is_help() {
        assert_eq!(Command::parse(&args(&[])).unwrap(), Command::Help);
        assert_eq!(Command::parse(&args(&["issue", "-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_issue() {
        let command = Command::parse(&args(&[
            "issue", "--key", "global", "--hours", "3", "user=u-1", "admin=true", "tenant=7",
        ]))
        .unwrap();

        let expected = Claims::new()
            .with("user", "u-1")
            .with("admin", true)
            .with("tenant", 7);
        assert_eq!(
            command,
            Command::Issue {
                kind: KeyKind::Global,
                hours: Some(3),
                claims: expected,
            }
        );
    }

    #[test]
    fn test_parse_validate_defaults_to_access() {
        let command = Command::parse(&args(&["validate", "Bearer abc"])).unwrap();
        assert_eq!(
            command,
            Command::Validate {
                kind: KeyKind::Access,
                token: "Bearer abc".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Command::parse(&args(&["rotate"])),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Command::parse(&args(&["claims"])),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Command::parse(&args(&["issue", "--hours", "soon"])),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Command::parse(&args(&["validate", "--key", "refresh", "abc"])),
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            Command::parse(&args(&["validate", "--key"])),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_claim() {
        assert_eq!(parse_claim("n=1").unwrap(), ("n".to_string(), json!(1)));
        assert_eq!(parse_claim("s=hello").unwrap(), ("s".to_string(), json!("hello")));
        assert_eq!(parse_claim("e=").unwrap(), ("e".to_string(), json!("")));
        assert_eq!(parse_claim("eq=a=b").unwrap(), ("eq".to_string(), json!("a=b")));
        assert!(parse_claim("novalue").is_err());
        assert!(parse_claim("=x").is_err());
    }
}

//! Fixture loading and management.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("io: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json: {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no fixture JSON files found in {}", .0.display())]
    Empty(PathBuf),
}

/// Errors from parsing a `kind:value` argument on the command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgParseError {
    #[error("expected kind:value, got {0:?}")]
    MissingKind(String),
    #[error("unknown argument kind {0:?} (int, uint, float, str, ptr, fill, null)")]
    UnknownKind(String),
    #[error("invalid {kind} value {value:?}")]
    InvalidValue { kind: &'static str, value: String },
}

/// One variadic argument of a fixture case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureArg {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    /// `len` copies of `ch`; keeps large payloads out of the JSON.
    Fill { ch: char, len: usize },
    Pointer(usize),
    /// A null `%s` argument.
    Null,
}

impl FixtureArg {
    /// Owned bytes for string-like arguments.
    #[must_use]
    pub fn payload(&self) -> Option<Vec<u8>> {
        match self {
            Self::Str(s) => Some(s.clone().into_bytes()),
            Self::Fill { ch, len } => Some(ch.to_string().repeat(*len).into_bytes()),
            _ => None,
        }
    }
}

impl FromStr for FixtureArg {
    type Err = ArgParseError;

    /// `int:42`, `uint:7`, `float:1.5`, `str:text`, `ptr:0x1000`, `fill:x*10000`, `null`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "null" {
            return Ok(Self::Null);
        }
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| ArgParseError::MissingKind(s.to_string()))?;
        let invalid = |kind: &'static str| ArgParseError::InvalidValue {
            kind,
            value: value.to_string(),
        };
        match kind {
            "int" => value.parse().map(Self::Int).map_err(|_| invalid("int")),
            "uint" => value.parse().map(Self::Uint).map_err(|_| invalid("uint")),
            "float" => value.parse().map(Self::Float).map_err(|_| invalid("float")),
            "str" => Ok(Self::Str(value.to_string())),
            "ptr" => {
                let digits = value.trim_start_matches("0x");
                usize::from_str_radix(digits, 16)
                    .map(Self::Pointer)
                    .map_err(|_| invalid("ptr"))
            }
            "fill" => {
                let (ch, len) = value.split_once('*').ok_or_else(|| invalid("fill"))?;
                let mut chars = ch.chars();
                match (chars.next(), chars.next(), len.parse::<usize>()) {
                    (Some(ch), None, Ok(len)) => Ok(Self::Fill { ch, len }),
                    _ => Err(invalid("fill")),
                }
            }
            other => Err(ArgParseError::UnknownKind(other.to_string())),
        }
    }
}

/// A single logger call and its expected console line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    /// Case identifier.
    pub name: String,
    /// Raw `fmi2Status` value; need not be a defined variant.
    pub status: i32,
    pub category: String,
    pub instance: String,
    /// printf format string passed as `message`.
    pub format: String,
    #[serde(default)]
    pub args: Vec<FixtureArg>,
    /// Exact expected line, terminator included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Expected line length in bytes, for payloads too large to spell out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_len: Option<usize>,
}

/// A collection of fixture cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    /// Schema version.
    pub version: String,
    /// Case family name (e.g. "logger").
    pub family: String,
    pub cases: Vec<FixtureCase>,
}

impl FixtureSet {
    /// Load fixture set from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize fixture set to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load fixture set from a file path.
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| FixtureError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load one file, or every `*.json` in a directory (sorted by name).
    pub fn load_path(path: &Path) -> Result<Vec<(PathBuf, Self)>, FixtureError> {
        if path.is_file() {
            return Ok(vec![(path.to_path_buf(), Self::from_file(path)?)]);
        }
        let entries = std::fs::read_dir(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(FixtureError::Empty(path.to_path_buf()));
        }
        paths
            .into_iter()
            .map(|p| Self::from_file(&p).map(|set| (p, set)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cli_args() {
        assert_eq!("int:-42".parse::<FixtureArg>(), Ok(FixtureArg::Int(-42)));
        assert_eq!("uint:7".parse::<FixtureArg>(), Ok(FixtureArg::Uint(7)));
        assert_eq!("float:1.5".parse::<FixtureArg>(), Ok(FixtureArg::Float(1.5)));
        assert_eq!(
            "str:a:b".parse::<FixtureArg>(),
            Ok(FixtureArg::Str("a:b".to_string()))
        );
        assert_eq!("ptr:0x1000".parse::<FixtureArg>(), Ok(FixtureArg::Pointer(0x1000)));
        assert_eq!(
            "fill:x*3".parse::<FixtureArg>(),
            Ok(FixtureArg::Fill { ch: 'x', len: 3 })
        );
        assert_eq!("null".parse::<FixtureArg>(), Ok(FixtureArg::Null));
    }

    #[test]
    fn reject_bad_cli_args() {
        assert_eq!(
            "42".parse::<FixtureArg>(),
            Err(ArgParseError::MissingKind("42".to_string()))
        );
        assert!(matches!(
            "bool:true".parse::<FixtureArg>(),
            Err(ArgParseError::UnknownKind(_))
        ));
        assert!(matches!(
            "int:abc".parse::<FixtureArg>(),
            Err(ArgParseError::InvalidValue { kind: "int", .. })
        ));
        assert!(matches!(
            "fill:xy*3".parse::<FixtureArg>(),
            Err(ArgParseError::InvalidValue { kind: "fill", .. })
        ));
    }

    #[test]
    fn json_arg_encoding() {
        let args: Vec<FixtureArg> = serde_json::from_str(
            r#"[{"int": 42}, {"str": "x"}, {"fill": {"ch": "z", "len": 4}}, "null"]"#,
        )
        .unwrap();
        assert_eq!(
            args,
            vec![
                FixtureArg::Int(42),
                FixtureArg::Str("x".to_string()),
                FixtureArg::Fill { ch: 'z', len: 4 },
                FixtureArg::Null,
            ]
        );
        assert_eq!(args[2].payload(), Some(b"zzzz".to_vec()));
        assert_eq!(args[0].payload(), None);
    }

    #[test]
    fn set_json_roundtrip_keeps_cases() {
        let json = r#"{
            "version": "1",
            "family": "logger",
            "cases": [{
                "name": "plain",
                "status": 0,
                "category": "c",
                "instance": "i",
                "format": "hi",
                "expected": "[OK][c][i]: hi\n"
            }]
        }"#;
        let set = FixtureSet::from_json(json).unwrap();
        assert_eq!(set.cases.len(), 1);
        assert!(set.cases[0].args.is_empty());
        let again = FixtureSet::from_json(&set.to_json().unwrap()).unwrap();
        assert_eq!(again.cases[0].expected.as_deref(), Some("[OK][c][i]: hi\n"));
    }
}

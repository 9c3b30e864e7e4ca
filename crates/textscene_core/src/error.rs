// SPDX-License-Identifier: MIT OR Apache-2.0
//! Warnings and error types shared by the codecs and the graph passes.
//!
//! Problems fall into two groups:
//! - recoverable ones become a [`Warning`] in a [`WarningLog`] and the
//!   operation carries on without the offending value or subtree
//! - fatal ones are returned as an error and abort the whole operation

use std::fmt;
use thiserror::Error;

/// A recoverable problem found while encoding or decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Where the problem was found (node path, component and member)
    pub location: String,
    /// What went wrong
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// Accumulates warnings for one serialize or deserialize call
#[derive(Debug, Clone, Default)]
pub struct WarningLog {
    entries: Vec<Warning>,
}

impl WarningLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn push(&mut self, location: impl Into<String>, message: impl Into<String>) {
        let warning = Warning {
            location: location.into(),
            message: message.into(),
        };
        tracing::debug!("{}", warning);
        self.entries.push(warning);
    }

    /// Append warnings collected elsewhere, prefixing their locations
    pub fn extend_prefixed(&mut self, prefix: &str, warnings: impl IntoIterator<Item = Warning>) {
        for mut warning in warnings {
            warning.location = if warning.location.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix} > {}", warning.location)
            };
            self.entries.push(warning);
        }
    }

    /// Number of warnings recorded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded warnings in order
    pub fn entries(&self) -> &[Warning] {
        &self.entries
    }

    /// Emit a single summary line for the whole operation
    pub fn summarize(&self, operation: &str) {
        if self.entries.is_empty() {
            return;
        }
        let list = self
            .entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n  ");
        tracing::warn!("{} finished with {} warning(s):\n  {}", operation, self.entries.len(), list);
    }

    /// Take the recorded warnings
    pub fn into_vec(self) -> Vec<Warning> {
        self.entries
    }
}

/// Malformed document structure
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    /// The input ended inside a block
    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// Line number after the last line read
        line: usize,
        /// What the reader was looking for
        expected: String,
    },
    /// A line did not start with the required keyword
    #[error("line {line}: expected '{expected}', found '{found}'")]
    Expected {
        /// One-based line number
        line: usize,
        /// Required keyword or shape
        expected: String,
        /// Offending line
        found: String,
    },
    /// A count or integer could not be parsed
    #[error("line {line}: invalid number '{text}'")]
    InvalidNumber {
        /// One-based line number
        line: usize,
        /// Offending token
        text: String,
    },
    /// A placement line had the wrong number of values
    #[error("line {line}: expected {expected} values, found {found}")]
    Arity {
        /// One-based line number
        line: usize,
        /// Number of values required
        expected: usize,
        /// Number of values present
        found: usize,
    },
    /// A token that is not a storage or value kind
    #[error("line {line}: unknown {what} '{token}'")]
    UnknownToken {
        /// One-based line number
        line: usize,
        /// Token category
        what: &'static str,
        /// Offending token
        token: String,
    },
}

/// Fatal failure of a whole load
#[derive(Debug, Error)]
pub enum LoadError {
    /// The text is structurally broken
    #[error("malformed document: {0}")]
    Format(#[from] FormatError),
    /// The document could not be read
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Document path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a save
#[derive(Debug, Error)]
pub enum SerializeError {
    /// Warnings were raised, nothing was written
    #[error("serialization raised {count} warning(s), nothing was written")]
    Rejected {
        /// Number of warnings
        count: usize,
        /// The warnings themselves
        warnings: Vec<Warning>,
    },
    /// Writing the document failed
    #[error("failed to write scene: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to assign a value to a member
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReflectError {
    /// No member with that name
    #[error("no member named '{0}'")]
    UnknownMember(String),
    /// The member has no setter
    #[error("member '{0}' is read-only")]
    ReadOnly(String),
    /// The value has the wrong type for the member
    #[error("member '{member}' expects {expected}, got {found}")]
    TypeMismatch {
        /// Member name
        member: String,
        /// Declared type
        expected: String,
        /// Type of the supplied value
        found: String,
    },
}

/// A value that cannot be written to text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The value has no asset path and no scene identity
    #[error("{type_name} '{name}' is neither an asset nor part of the scene")]
    Unrepresentable {
        /// Runtime type of the value
        type_name: String,
        /// Display name of the value
        name: String,
    },
    /// A node reference points outside the scene
    #[error("reference to a node that is not in the scene")]
    Dangling,
    /// An array element could not be written
    #[error("array element {index}: {source}")]
    Element {
        /// Element index
        index: usize,
        /// Underlying error
        #[source]
        source: Box<EncodeError>,
    },
}

/// A value record that cannot be turned into a value
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Text does not parse as the declared type
    #[error("cannot parse '{text}' as {type_name}")]
    Parse {
        /// Declared type
        type_name: String,
        /// Offending text
        text: String,
    },
    /// Declared type is not known
    #[error("unknown primitive type '{0}'")]
    UnknownType(String),
    /// Enum member not in the registered member list
    #[error("'{member}' is not a member of {type_name}")]
    UnknownEnumMember {
        /// Enum type
        type_name: String,
        /// Offending member name
        member: String,
    },
    /// Asset could not be found
    #[error("missing asset '{0}'")]
    MissingAsset(String),
    /// Scenelink target not found
    #[error("unable to find '{0}' in scene")]
    MissingTarget(String),
    /// Scenelink target node lacks the component type
    #[error("'{path}' has no {type_name} component")]
    MissingComponent {
        /// Target node path
        path: String,
        /// Requested component type
        type_name: String,
    },
    /// Unknown builtin mesh or material
    #[error("unknown builtin {kind} '{name}'")]
    UnknownBuiltin {
        /// `mesh` or `material`
        kind: &'static str,
        /// Requested name
        name: String,
    },
}

/// Convenience alias for load results
pub type Result<T, E = LoadError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let w = Warning {
            location: "/Root/Child".into(),
            message: "missing asset".into(),
        };
        assert_eq!(w.to_string(), "/Root/Child: missing asset");
    }

    #[test]
    fn test_extend_prefixed() {
        let mut inner = WarningLog::new();
        inner.push("/A", "first");
        inner.push("", "second");

        let mut outer = WarningLog::new();
        outer.extend_prefixed("Assets/Sub.txt", inner.into_vec());

        assert_eq!(outer.len(), 2);
        assert_eq!(outer.entries()[0].location, "Assets/Sub.txt > /A");
        assert_eq!(outer.entries()[1].location, "Assets/Sub.txt");
    }
}

use std::{collections::TryReserveError, fmt};

use regex_automata::{MatchError, Span};
use thiserror::Error;

/// How a host should treat a [`Diagnostic`].
///
/// The engine never aborts the process itself. Whether an error stops the host
/// (e.g. fails a build) or only gets logged is up to the [`Environment`](crate::env::Environment).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Error => "error",
            Level::Warning => "warning",
        })
    }
}

/// Optional engine capabilities that some options depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    UnicodeProperties,
    Utf8,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feature::UnicodeProperties => "Unicode property support",
            Feature::Utf8 => "UTF-8 support",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Parsing continues with the next option character.
    #[error("{context}: unknown option '{flag}'")]
    UnknownOption { context: String, flag: char },

    /// The option is dropped.
    #[error("{context}: option '{flag}' ignored, {feature} is not available")]
    UnsupportedFeature {
        context: String,
        flag: char,
        feature: Feature,
    },

    /// `offset` is the byte offset in the pattern, if the failure can be pinned to one.
    #[error("{}{message}", .offset.map(|offset| format!("{offset}: ")).unwrap_or_default())]
    Compile {
        offset: Option<usize>,
        message: String,
    },

    /// Building the optimization data failed. The pattern is still usable.
    #[error("study failed: {0}")]
    Study(String),

    #[error("match failed at offset {offset}: {source}")]
    Match { offset: usize, source: MatchError },

    #[error("cannot extract group {group}: span {}..{} is outside the subject of length {len}", .span.start, .span.end)]
    Extraction { group: usize, span: Span, len: usize },

    #[error("cannot grow output by {additional} bytes: {source}")]
    Allocation {
        additional: usize,
        source: TryReserveError,
    },
}

impl Error {
    /// The level this error is reported with by default.
    pub fn level(&self) -> Level {
        match self {
            Error::UnsupportedFeature { .. } | Error::Study(_) => Level::Warning,
            _ => Level::Error,
        }
    }

    pub(crate) fn compile(offset: Option<usize>, message: impl Into<String>) -> Self {
        Error::Compile {
            offset,
            message: message.into(),
        }
    }
}

impl From<regex_syntax::Error> for Error {
    fn from(e: regex_syntax::Error) -> Self {
        match e {
            regex_syntax::Error::Parse(e) => {
                Error::compile(Some(e.span().start.offset), e.kind().to_string())
            }
            regex_syntax::Error::Translate(e) => {
                Error::compile(Some(e.span().start.offset), e.kind().to_string())
            }
            // `regex_syntax::Error` is non-exhaustive
            e => Error::compile(None, e.to_string()),
        }
    }
}

impl From<regex_automata::nfa::thompson::BuildError> for Error {
    fn from(e: regex_automata::nfa::thompson::BuildError) -> Self {
        Error::compile(None, e.to_string())
    }
}

/// A message delivered to an [`Environment`](crate::env::Environment).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub error: Error,
}

impl Diagnostic {
    pub fn new(level: Level, error: Error) -> Self {
        Self { level, error }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl From<Error> for Diagnostic {
    fn from(error: Error) -> Self {
        Self::new(error.level(), error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let e = Error::UnknownOption {
            context: "find".into(),
            flag: 'q',
        };
        assert_eq!(e.to_string(), "find: unknown option 'q'");
        assert_eq!(
            Diagnostic::from(e).to_string(),
            "error: find: unknown option 'q'"
        );

        let e = Error::compile(Some(3), "unclosed group");
        assert_eq!(e.to_string(), "3: unclosed group");
        let e = Error::compile(None, "exceeded size limit");
        assert_eq!(e.to_string(), "exceeded size limit");

        let e = Error::Extraction {
            group: 2,
            span: Span::from(4..9),
            len: 6,
        };
        assert_eq!(
            e.to_string(),
            "cannot extract group 2: span 4..9 is outside the subject of length 6"
        );
    }

    #[test]
    fn level() {
        assert_eq!(Error::Study("too big".into()).level(), Level::Warning);
        assert_eq!(
            Error::UnsupportedFeature {
                context: "find".into(),
                flag: 'u',
                feature: Feature::UnicodeProperties,
            }
            .level(),
            Level::Warning
        );
        assert_eq!(Error::compile(Some(0), "x").level(), Level::Error);
    }

    #[test]
    fn from_syntax() {
        let e: Error = regex_syntax::parse("ab(c").unwrap_err().into();
        assert!(matches!(e, Error::Compile { offset: Some(2), .. }), "{e:?}");
    }
}

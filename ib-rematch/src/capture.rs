/*!
Capture extraction: turning the spans of a match into subject slices and
pushing them into an [`Environment`].
*/
use regex_automata::Span;

use crate::{
    env::Environment,
    error::{Diagnostic, Error},
    regex::{Groups, Pattern},
};

/// The captured text of one match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Captures<'p, 'h> {
    /// Indexed by group. `None` for a group that did not participate.
    positional: Vec<Option<&'h [u8]>>,
    /// Named groups that participated, in group order.
    named: Vec<(&'p str, &'h [u8])>,
    error: Option<Error>,
}

/// Slice the groups of a match out of `subject`.
///
/// Extraction stops at the first group whose span does not fit into `subject`;
/// the groups before it are kept and [`Captures::error`] tells what happened.
pub fn extract<'p, 'h>(pattern: &'p Pattern, subject: &'h [u8], groups: &Groups) -> Captures<'p, 'h> {
    let mut positional = Vec::with_capacity(groups.len());
    let mut error = None;
    for (group, span) in groups.iter().enumerate() {
        match span.map(|span| slice(subject, group, span)).transpose() {
            Ok(value) => positional.push(value),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }

    let named = pattern
        .names()
        .iter()
        .filter_map(|(name, i)| Some((name, (*positional.get(i)?)?)))
        .collect();

    Captures {
        positional,
        named,
        error,
    }
}

fn slice(subject: &[u8], group: usize, span: Span) -> Result<&[u8], Error> {
    subject.get(span.range()).ok_or(Error::Extraction {
        group,
        span,
        len: subject.len(),
    })
}

impl<'p, 'h> Captures<'p, 'h> {
    pub fn get(&self, index: usize) -> Option<&'h [u8]> {
        self.positional.get(index).copied().flatten()
    }

    pub fn name(&self, name: &str) -> Option<&'h [u8]> {
        self.named
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, value)| value)
    }

    pub fn positional(&self) -> &[Option<&'h [u8]>] {
        &self.positional
    }

    pub fn named(&self) -> &[(&'p str, &'h [u8])] {
        &self.named
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Push the captures into `env`: every extracted positional group, then the
    /// named groups that participated. An extraction error is reported as a
    /// diagnostic.
    ///
    /// Returns the number of positional slots bound.
    pub fn bind_to<E: Environment + ?Sized>(&self, env: &mut E) -> usize {
        for (i, value) in self.positional.iter().enumerate() {
            env.bind_positional(i, *value);
        }
        for &(name, value) in &self.named {
            env.bind_named(name, value);
        }
        if let Some(e) = &self.error {
            env.diagnostic(Diagnostic::from(e.clone()));
        }
        self.positional.len()
    }
}

use bstr::decode_utf8;
use regex_automata::Span;
use tracing::trace;

use crate::{
    buffer::OutputBuffer,
    capture,
    env::Environment,
    error::Error,
    regex::{Cache, Groups, MatchResult, Pattern},
};

/// An iterator over the matches of a pattern in a subject.
///
/// Without `global` it stops after the first match. Otherwise the next search
/// starts where the previous match ended; after an empty match it starts one
/// character later, so every empty match is reported once and the iteration
/// always terminates. An empty match at the end of the subject is the last one.
///
/// A failed search is yielded once as an error and ends the iteration.
pub struct Matches<'p, 'h> {
    pattern: &'p Pattern,
    cache: Cache,
    subject: &'h [u8],
    next: Option<usize>,
    global: bool,
}

impl<'p, 'h> Matches<'p, 'h> {
    pub fn new(pattern: &'p Pattern, subject: &'h [u8], global: bool) -> Self {
        Self {
            pattern,
            cache: pattern.create_cache(),
            subject,
            next: Some(0),
            global,
        }
    }

    fn advance(&self, m: Span) -> Option<usize> {
        if !m.is_empty() {
            Some(m.end)
        } else if m.end < self.subject.len() {
            Some(m.end + char_len(self.subject, m.end, self.pattern.options().is_utf8()))
        } else {
            None
        }
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = Result<Groups, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next.take()?;
        match self.pattern.exec(&mut self.cache, self.subject, offset) {
            MatchResult::NoMatch => None,
            MatchResult::Error(source) => Some(Err(Error::Match { offset, source })),
            MatchResult::Matched(groups) => {
                let m = groups.get_match();
                trace!(start = m.start, end = m.end, "match");
                if self.global {
                    self.next = self.advance(m);
                }
                Some(Ok(groups))
            }
        }
    }
}

/// What one call made of a subject.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub output: Vec<u8>,
    pub matches: usize,
    /// Positional slots bound by the last match.
    pub bound: usize,
}

/// Collect the text of the first match, or of every match if `global`, joined by
/// single spaces.
///
/// Captures of every match are bound into `env`, so named bindings accumulate and
/// positional ones are those of the last match. A failed search is reported and
/// ends the loop, keeping the matches collected before it.
pub(crate) fn find<E: Environment + ?Sized>(
    env: &mut E,
    pattern: &Pattern,
    subject: &[u8],
    global: bool,
) -> Result<Outcome, Error> {
    let mut out = OutputBuffer::new();
    let mut outcome = Outcome::default();
    for groups in Matches::new(pattern, subject, global) {
        let groups = match groups {
            Ok(groups) => groups,
            Err(e) => {
                env.diagnostic(e.into());
                break;
            }
        };
        let caps = capture::extract(pattern, subject, &groups);
        outcome.bound = caps.bind_to(env);

        if outcome.matches != 0 {
            out.push_byte(b' ')?;
        }
        out.push(&subject[groups.get_match().range()])?;
        outcome.matches += 1;
    }
    outcome.output = out.into_inner();
    Ok(outcome)
}

/// The length of the character at `at`, which must be in bounds.
///
/// In UTF-8 mode an invalid sequence counts as one byte per byte.
pub(crate) fn char_len(subject: &[u8], at: usize, utf8: bool) -> usize {
    if utf8 {
        decode_utf8(&subject[at..]).1.max(1)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use crate::options::CompileOptions;

    use super::*;

    fn spans(pattern: &Pattern, subject: &str, global: bool) -> Vec<(usize, usize)> {
        Matches::new(pattern, subject.as_bytes(), global)
            .map(|groups| {
                let m = groups.unwrap().get_match();
                (m.start, m.end)
            })
            .collect()
    }

    #[test]
    fn global() {
        let pattern = Pattern::new(r"\d+").unwrap();
        assert_eq!(spans(&pattern, "a1b22c333", true), [(1, 2), (3, 5), (6, 9)]);
        assert_eq!(spans(&pattern, "a1b22c333", false), [(1, 2)]);
        assert!(spans(&pattern, "abc", true).is_empty());
    }

    #[test]
    fn empty_matches() {
        let pattern = Pattern::new("a*").unwrap();
        assert_eq!(
            spans(&pattern, "baaab", true),
            [(0, 0), (1, 4), (4, 4), (5, 5)]
        );
        assert_eq!(spans(&pattern, "", true), [(0, 0)]);

        let pattern = Pattern::new("x*").unwrap();
        assert_eq!(spans(&pattern, "aaa", true), [(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn empty_matches_utf8() {
        let pattern = Pattern::builder()
            .options(CompileOptions::UTF8)
            .build("")
            .unwrap();
        assert_eq!(spans(&pattern, "éa", true), [(0, 0), (2, 2), (3, 3)]);

        // Byte mode steps into the codepoint
        let pattern = Pattern::new("").unwrap();
        assert_eq!(spans(&pattern, "é", true), [(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn anchored() {
        let pattern = Pattern::builder()
            .options(CompileOptions::ANCHORED)
            .build(r"\d")
            .unwrap();
        assert_eq!(spans(&pattern, "12a3", true), [(0, 1), (1, 2)]);
    }

    #[test]
    fn error_ends_iteration() {
        let pattern = Pattern::builder()
            .backtrack(crate::regex::backtrack::Config::new().visited_capacity(1))
            .build("a")
            .unwrap();
        let subject = "b".repeat(1000);
        let mut matches = Matches::new(&pattern, subject.as_bytes(), true);
        assert!(matches!(matches.next(), Some(Err(Error::Match { offset: 0, .. }))));
        assert!(matches.next().is_none());
    }

    #[test]
    fn find_joins_with_spaces() {
        let mut env = crate::env::Bindings::new();
        let pattern = Pattern::new("a*").unwrap();
        let outcome = find(&mut env, &pattern, b"baaab", true).unwrap();
        assert_eq!(outcome.output, b" aaa  ");
        assert_eq!(outcome.matches, 4);
        assert_eq!(outcome.bound, 1);

        let pattern = Pattern::new(r"(\d)(\d)?").unwrap();
        let outcome = find(&mut env, &pattern, b"1 23 4", true).unwrap();
        assert_eq!(outcome.output, b"1 23 4");
        assert_eq!(env.positional(1), Some(&b"4"[..]));
        assert_eq!(env.positional(2), None);

        let outcome = find(&mut env, &pattern, b"1 23 4", false).unwrap();
        assert_eq!(outcome.output, b"1");
        assert_eq!(outcome.matches, 1);
    }

    #[test]
    fn char_length() {
        assert_eq!(char_len("aé".as_bytes(), 1, true), 2);
        assert_eq!(char_len("aé".as_bytes(), 1, false), 1);
        assert_eq!(char_len(b"\xFFa", 0, true), 1);
    }
}

/*!
Pattern compilation and execution.

A [`Pattern`] is compiled from pattern text and [`CompileOptions`](crate::options::CompileOptions)
into a Thompson NFA, and is executed by a bounded backtracker. Optionally it can be
[studied](Pattern::study), which adds a pair of dense DFAs used to locate matches
before the backtracker resolves their capture groups.

The syntax is the same as the [`regex`](https://docs.rs/regex/) crate, see
[`regex_syntax`] for details.

## Example
```
use ib_rematch::regex::{MatchResult, Pattern};

let pattern = Pattern::new(r"(?<year>\d{4})-(\d{2})")?;
let mut cache = pattern.create_cache();
let MatchResult::Matched(groups) = pattern.exec(&mut cache, b"on 2024-01", 0) else {
    unreachable!()
};
assert_eq!(groups.get_match().range(), 3..10);
assert_eq!(pattern.names().get("year"), Some(1));

# Ok::<(), ib_rematch::Error>(())
```
*/
use std::sync::Arc;

use regex_automata::{
    util::captures::{Captures, GroupInfo},
    MatchError, PatternID, Span,
};

mod pattern;
mod study;

pub use pattern::{Builder, Cache, Pattern};
pub use regex_automata::nfa::thompson::backtrack;

/// The maximum number of capture groups reported per match, group 0 included.
pub const MAX_CAPTURES: usize = 256;

/// The outcome of one execution of a [`Pattern`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    Error(MatchError),
    Matched(Groups),
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }
}

/// The spans of the capture groups of a match.
///
/// Group 0 is the whole match and is always present. `None` marks a group that
/// did not participate in the match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Groups {
    spans: Vec<Option<Span>>,
    total: usize,
}

impl Groups {
    /// Returns `None` if `caps` has no match.
    pub(crate) fn from_captures(caps: &Captures, max: usize) -> Option<Self> {
        caps.get_match()?;
        let total = caps.group_len();
        let spans = (0..total.min(max.max(1)))
            .map(|i| caps.get_group(i))
            .collect();
        Some(Self { spans, total })
    }

    /// Mainly for tests and hosts that run their own matcher.
    pub fn new(spans: Vec<Option<Span>>) -> Self {
        assert!(
            spans.first().is_some_and(Option::is_some),
            "group 0 must be present"
        );
        let total = spans.len();
        Self { spans, total }
    }

    pub fn get_match(&self) -> Span {
        // Checked on construction
        self.spans[0].unwrap_or(Span { start: 0, end: 0 })
    }

    pub fn get(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied().flatten()
    }

    /// The number of groups kept, at most the maximum capture count.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The number of groups in the pattern, including those over the maximum.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_truncated(&self) -> bool {
        self.total > self.spans.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Span>> + '_ {
        self.spans.iter().copied()
    }
}

/// Capture group names of a pattern, mapped to their group indices.
///
/// Derived once per [`Pattern`] and read-only afterwards. Empty if the pattern
/// has no named groups.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupNames {
    /// Indexed by group.
    by_index: Vec<Option<Arc<str>>>,
}

impl GroupNames {
    pub(crate) fn from_group_info(info: &GroupInfo) -> Self {
        if info.pattern_len() == 0 {
            return Self::default();
        }
        let by_index = info
            .pattern_names(PatternID::ZERO)
            .map(|name| name.map(Arc::from))
            .collect();
        Self { by_index }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_index
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.by_index.get(index)?.as_deref()
    }

    /// `(name, index)` pairs in group order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.by_index
            .iter()
            .enumerate()
            .filter_map(|(i, name)| Some((name.as_deref()?, i)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use bon::bon;
use regex_automata::{
    nfa::thompson::{
        self,
        backtrack::{self, BoundedBacktracker},
    },
    util::{captures::Captures, syntax},
    Anchored, Input, PatternID,
};
use regex_syntax::hir::Hir;
use tracing::{debug, trace};

use crate::{
    error::Error,
    options::CompileOptions,
    regex::{study::Study, GroupNames, Groups, MatchResult, MAX_CAPTURES},
};

/// A compiled pattern.
///
/// Immutable once built, except for [`Pattern::study`]. Searching needs a
/// [`Cache`], which is created per pattern and can be reused across searches.
#[derive(Clone, Debug)]
pub struct Pattern {
    re: BoundedBacktracker,
    /// Kept for studying.
    hir: Hir,
    options: CompileOptions,
    names: GroupNames,
    max_captures: usize,
    study: Option<Study>,
}

/// Mutable scratch space for [`Pattern::exec`].
#[derive(Clone, Debug)]
pub struct Cache {
    backtrack: backtrack::Cache,
    captures: Captures,
}

#[bon]
impl Pattern {
    /// Compile `pattern` with default options.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::builder().build(pattern)
    }

    /// Return a builder for configuring the compilation of a `Pattern`.
    ///
    /// ```
    /// use ib_rematch::{options::CompileOptions, regex::Pattern};
    ///
    /// let pattern = Pattern::builder()
    ///     .options(CompileOptions::CASE_INSENSITIVE)
    ///     .max_captures(2)
    ///     .build(r"(a)(b)")?;
    /// assert_eq!(pattern.group_len(), 3);
    ///
    /// # Ok::<(), ib_rematch::Error>(())
    /// ```
    #[builder(builder_type = Builder, finish_fn(name = build_from_hir, doc {
    /// Builds a `Pattern` directly from an already parsed `Hir`.
    ///
    /// The syntax part of [`Builder::options`] is ignored, it only applies when
    /// parsing pattern text.
    }))]
    pub fn builder(
        #[builder(field)] options: CompileOptions,
        #[builder(finish_fn)] hir: Hir,
        /// The maximum number of groups reported per match, group 0 included.
        #[builder(default = MAX_CAPTURES)]
        max_captures: usize,
        #[builder(default = backtrack::Config::new().visited_capacity(usize::MAX / 8))]
        backtrack: backtrack::Config,
    ) -> Result<Self, Error> {
        let nfa = thompson::Compiler::new()
            .configure(options.thompson())
            .build_from_hir(&hir)?;
        let re = BoundedBacktracker::builder()
            .configure(backtrack)
            .build_from_nfa(nfa)?;
        let names = GroupNames::from_group_info(re.get_nfa().group_info());
        debug!(
            states = re.get_nfa().states().len(),
            names = names.len(),
            "compiled"
        );

        Ok(Self {
            re,
            hir,
            options,
            names,
            max_captures,
            study: None,
        })
    }
}

impl<S: builder::State> Builder<S> {
    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds a `Pattern` from pattern text.
    ///
    /// Parse errors carry the byte offset of the offending part of `pattern`.
    pub fn build(self, pattern: &str) -> Result<Pattern, Error>
    where
        S: builder::IsComplete,
    {
        let hir = syntax::parse_with(pattern, &self.options.syntax())?;
        self.build_from_hir(hir)
    }

    /// Builds a `Pattern` from pattern bytes, which must be valid UTF-8.
    pub fn build_from_bytes(self, pattern: &[u8]) -> Result<Pattern, Error>
    where
        S: builder::IsComplete,
    {
        let pattern = std::str::from_utf8(pattern)
            .map_err(|e| Error::compile(Some(e.valid_up_to()), "pattern is not valid UTF-8"))?;
        self.build(pattern)
    }
}

impl Pattern {
    /// Build optimization data for later searches.
    ///
    /// On failure the pattern stays usable, just unoptimized.
    pub fn study(&mut self, size_limit: usize) -> Result<(), Error> {
        let study = Study::build(&self.hir, self.options.thompson(), size_limit)?;
        debug!("studied");
        self.study = Some(study);
        Ok(())
    }

    pub fn is_studied(&self) -> bool {
        self.study.is_some()
    }

    pub fn create_cache(&self) -> Cache {
        Cache {
            backtrack: self.re.create_cache(),
            captures: self.re.create_captures(),
        }
    }

    /// Search `subject` for the leftmost match starting at or after `offset`.
    ///
    /// Look-around assertions still see the text before `offset`, e.g. `\b` and
    /// `^` in multi-line mode. An `offset` past the end of `subject` never matches.
    pub fn exec(&self, cache: &mut Cache, subject: &[u8], offset: usize) -> MatchResult {
        if offset > subject.len() {
            return MatchResult::NoMatch;
        }
        let mut input = Input::new(subject)
            .range(offset..)
            .anchored(self.options.anchored());

        if let Some(study) = &self.study {
            match study.locate(&input) {
                Ok(None) => return MatchResult::NoMatch,
                Ok(Some(start)) => {
                    input.set_start(start);
                    input.set_anchored(Anchored::Yes);
                }
                Err(e) => trace!(%e, "study gave up"),
            }
        }

        match self
            .re
            .try_search(&mut cache.backtrack, &input, &mut cache.captures)
        {
            Ok(()) => match Groups::from_captures(&cache.captures, self.max_captures) {
                Some(groups) => MatchResult::Matched(groups),
                None => MatchResult::NoMatch,
            },
            Err(e) => MatchResult::Error(e),
        }
    }

    pub fn names(&self) -> &GroupNames {
        &self.names
    }

    /// The number of groups in the pattern, group 0 included.
    pub fn group_len(&self) -> usize {
        self.re.get_nfa().group_info().group_len(PatternID::ZERO)
    }

    pub fn max_captures(&self) -> usize {
        self.max_captures
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// The longest subject span the backtracker can search.
    pub fn max_haystack_len(&self) -> usize {
        self.re.max_haystack_len()
    }
}

#[cfg(test)]
mod tests {
    use regex_automata::{MatchErrorKind, Span};

    use super::*;

    fn exec(pattern: &Pattern, subject: &str, offset: usize) -> Option<Vec<Option<Span>>> {
        let mut cache = pattern.create_cache();
        match pattern.exec(&mut cache, subject.as_bytes(), offset) {
            MatchResult::Matched(groups) => Some(groups.iter().collect()),
            MatchResult::NoMatch => None,
            MatchResult::Error(e) => panic!("{e}"),
        }
    }

    fn span(r: std::ops::Range<usize>) -> Option<Span> {
        Some(Span::from(r))
    }

    #[test]
    fn compile_error() {
        let e = Pattern::new("a(b").unwrap_err();
        assert!(matches!(e, Error::Compile { offset: Some(1), .. }), "{e:?}");

        let e = Pattern::new(r"a\qb").unwrap_err();
        assert!(matches!(e, Error::Compile { offset: Some(1), .. }), "{e:?}");

        let e = Pattern::builder()
            .build_from_bytes(b"ab\xFFc")
            .unwrap_err();
        assert_eq!(e, Error::compile(Some(2), "pattern is not valid UTF-8"));
    }

    #[test]
    fn groups() {
        let pattern = Pattern::new(r"(\d+)(x)?").unwrap();
        assert_eq!(pattern.group_len(), 3);
        assert!(pattern.names().is_empty());
        assert_eq!(
            exec(&pattern, "ab12cd", 0),
            Some(vec![span(2..4), span(2..4), None])
        );
        assert_eq!(exec(&pattern, "ab12cd", 3), Some(vec![span(3..4), span(3..4), None]));
        assert_eq!(exec(&pattern, "ab12cd", 4), None);
        assert_eq!(exec(&pattern, "ab12cd", 7), None);
    }

    #[test]
    fn names() {
        let pattern = Pattern::new(r"(?<y>\d{4})-(\d\d)-(?P<d>\d\d)").unwrap();
        assert_eq!(pattern.names().get("y"), Some(1));
        assert_eq!(pattern.names().get("d"), Some(3));
        assert_eq!(exec(&pattern, "2024-01-31", 0).unwrap()[3], span(8..10));
    }

    #[test]
    fn offset_keeps_look_behind() {
        let pattern = Pattern::new(r"\bb").unwrap();
        assert_eq!(exec(&pattern, "ab b", 1), Some(vec![span(3..4)]));
    }

    #[test]
    fn options() {
        let pattern = Pattern::builder()
            .options(CompileOptions::CASE_INSENSITIVE)
            .build("abc")
            .unwrap();
        assert_eq!(exec(&pattern, "xABC", 0), Some(vec![span(1..4)]));

        let pattern = Pattern::builder()
            .options(CompileOptions::ANCHORED)
            .build("b")
            .unwrap();
        assert_eq!(exec(&pattern, "ab", 0), None);
        assert_eq!(exec(&pattern, "ab", 1), Some(vec![span(1..2)]));

        // Byte mode
        let pattern = Pattern::new(".").unwrap();
        assert_eq!(exec(&pattern, "é", 0), Some(vec![span(0..1)]));
        let pattern = Pattern::builder()
            .options(CompileOptions::UTF8)
            .build(".")
            .unwrap();
        assert_eq!(exec(&pattern, "é", 0), Some(vec![span(0..2)]));
    }

    #[test]
    fn max_captures() {
        let pattern = Pattern::builder()
            .max_captures(2)
            .build("(a)(b)(c)")
            .unwrap();
        let mut cache = pattern.create_cache();
        let MatchResult::Matched(groups) = pattern.exec(&mut cache, b"abc", 0) else {
            panic!()
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.total(), 4);
        assert!(groups.is_truncated());
    }

    #[test]
    fn study() {
        let subjects = ["", "foo", "a foo1 foo22", "bar 12", "é 3 foo"];
        for p in [r"foo(\d+)", r"(\d*)", r"\bfoo\b", r"^(b)ar"] {
            let plain = Pattern::new(p).unwrap();
            let mut studied = plain.clone();
            studied.study(10 << 20).unwrap();
            assert!(studied.is_studied());
            for s in subjects {
                for offset in 0..=s.len() {
                    assert_eq!(exec(&plain, s, offset), exec(&studied, s, offset), "{p} {s} {offset}");
                }
            }
        }

        let mut pattern = Pattern::new(r"\w{100}").unwrap();
        assert!(matches!(pattern.study(1), Err(Error::Study(_))));
        assert!(!pattern.is_studied());
    }

    #[test]
    fn haystack_too_long() {
        let pattern = Pattern::builder()
            .backtrack(backtrack::Config::new().visited_capacity(1))
            .build("a+")
            .unwrap();
        let subject = "b".repeat(1000);
        let mut cache = pattern.create_cache();
        match pattern.exec(&mut cache, subject.as_bytes(), 0) {
            MatchResult::Error(e) => {
                assert!(matches!(e.kind(), MatchErrorKind::HaystackTooLong { .. }))
            }
            r => panic!("{r:?}"),
        }
    }
}

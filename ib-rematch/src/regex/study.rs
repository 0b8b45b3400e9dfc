use regex_automata::{
    dfa::{self, dense, StartKind},
    nfa::thompson,
    util::prefilter::Prefilter,
    Input, MatchError, MatchKind,
};
use regex_syntax::hir::Hir;

use crate::error::Error;

/// Optimization data of a studied pattern: a forward and reverse dense DFA pair.
///
/// The DFAs only report where the leftmost match starts. Capture groups are still
/// resolved by the backtracker, anchored at that start.
#[derive(Clone, Debug)]
pub(crate) struct Study {
    dfa: dfa::regex::Regex,
}

impl Study {
    pub fn build(hir: &Hir, thompson: thompson::Config, size_limit: usize) -> Result<Self, Error> {
        // We can always forcefully disable captures because DFAs do not
        // support them.
        let thompson = thompson.which_captures(thompson::WhichCaptures::None);
        let dense = dense::Config::new()
            .dfa_size_limit(Some(size_limit))
            .determinize_size_limit(Some(size_limit))
            // Quit on non-ASCII instead of failing the build
            .unicode_word_boundary(true);

        let mut compiler = thompson::Compiler::new();

        let forward_nfa = compiler
            .configure(thompson.clone())
            .build_from_hir(hir)
            .map_err(|e| Error::Study(e.to_string()))?;
        let forward = dense::Builder::new()
            .configure(
                dense
                    .clone()
                    .start_kind(StartKind::Both)
                    .prefilter(Prefilter::from_hir_prefix(MatchKind::LeftmostFirst, hir)),
            )
            .build_from_nfa(&forward_nfa)
            .map_err(|e| Error::Study(e.to_string()))?;

        let reverse_nfa = compiler
            .configure(thompson.reverse(true))
            .build_from_hir(hir)
            .map_err(|e| Error::Study(e.to_string()))?;
        let reverse = dense::Builder::new()
            .configure(
                dense
                    .prefilter(None)
                    .specialize_start_states(false)
                    .start_kind(StartKind::Anchored)
                    .match_kind(MatchKind::All),
            )
            .build_from_nfa(&reverse_nfa)
            .map_err(|e| Error::Study(e.to_string()))?;

        Ok(Self {
            dfa: dfa::regex::Regex::builder().build_from_dfas(forward, reverse),
        })
    }

    /// Where the leftmost match in `input` starts, if any.
    ///
    /// Fails if the DFA gives up, e.g. on a Unicode word boundary next to non-ASCII.
    pub fn locate(&self, input: &Input<'_>) -> Result<Option<usize>, MatchError> {
        Ok(self.dfa.try_search(input)?.map(|m| m.start()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn study(pattern: &str) -> Study {
        let hir = regex_syntax::parse(pattern).unwrap();
        Study::build(&hir, thompson::Config::new(), 10 << 20).unwrap()
    }

    #[test]
    fn locate() {
        let s = study(r"b+c");
        assert_eq!(s.locate(&Input::new("aabbbc")), Ok(Some(2)));
        assert_eq!(s.locate(&Input::new("aabbb")), Ok(None));
        assert_eq!(s.locate(&Input::new("bc bc").range(1..)), Ok(Some(3)));
        assert_eq!(
            s.locate(&Input::new("abc").anchored(regex_automata::Anchored::Yes)),
            Ok(None)
        );
    }

    #[test]
    fn unicode_word_boundary() {
        let s = study(r"\bfoo\b");
        assert_eq!(s.locate(&Input::new("a foo")), Ok(Some(2)));
        assert!(s.locate(&Input::new("é foo")).is_err());
    }

    #[test]
    fn size_limit() {
        let hir = regex_syntax::parse(r"\w{50}").unwrap();
        let e = Study::build(&hir, thompson::Config::new(), 1).unwrap_err();
        assert!(matches!(e, Error::Study(_)));
    }
}

use std::borrow::Cow;

use bon::Builder;
use tracing::{debug, instrument};

use crate::{
    env::{unbind_positional_range, Environment},
    error::Error,
    iter::{self, Outcome},
    options::{self, Behavior, Capabilities},
    regex::{backtrack, Pattern, MAX_CAPTURES},
    subst::{self, Template},
};

/// Per-process engine configuration and the entry points of the crate.
///
/// Every call compiles its pattern anew; nothing is cached between calls.
///
/// ```
/// use ib_rematch::{env::Bindings, options::Capabilities, Engine};
///
/// let engine = Engine::builder()
///     .capabilities(Capabilities::none())
///     .max_captures(8)
///     .build();
/// let mut env = Bindings::new();
/// assert_eq!(engine.find(&mut env, r"\d+", "a 42", ""), Some(b"42".to_vec()));
///
/// // `8` is not available, dropped with a warning
/// assert_eq!(engine.substitute(&mut env, ".", "_", "é", "g8"), Some(b"__".to_vec()));
/// assert!(!env.has_errors());
/// assert_eq!(env.diagnostics().len(), 1);
/// ```
#[derive(Builder, Clone, Debug)]
pub struct Engine {
    /// Default: [`Capabilities::detect()`]
    #[builder(default)]
    capabilities: Capabilities,
    /// The maximum number of capture groups bound per match, group 0 included.
    ///
    /// Positional slots up to this count are cleared when no match occupies them.
    #[builder(default = MAX_CAPTURES)]
    max_captures: usize,
    #[builder(default = backtrack::Config::new().visited_capacity(usize::MAX / 8))]
    backtrack: backtrack::Config,
    /// Size limit in bytes of each DFA built by the `S` option.
    #[builder(default = 10 << 20)]
    study_size_limit: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Engine {
    /// Find the first match of `pattern` in `subject`, or with the `g` option every
    /// match, joined by single spaces.
    ///
    /// Returns `None` if nothing matched or the pattern failed to compile. Captures
    /// are bound into `env` as they are found; see [`crate::find`].
    #[instrument(level = "debug", skip_all, fields(flags = flags))]
    pub fn find<E: Environment + ?Sized>(
        &self,
        env: &mut E,
        pattern: impl AsRef<[u8]>,
        subject: impl AsRef<[u8]>,
        flags: &str,
    ) -> Option<Vec<u8>> {
        let subject = subject.as_ref();
        let (pattern, behavior) = self.compile(env, pattern.as_ref(), flags, "find")?;
        let result = iter::find(env, &pattern, subject, behavior.contains(Behavior::GLOBAL));
        let outcome = self.finish(env, result)?;
        debug!(matches = outcome.matches, "found");
        (outcome.matches != 0).then_some(outcome.output)
    }

    /// Replace the first match of `pattern` in `subject`, or with the `g` option
    /// every match, by `replacement`.
    ///
    /// Returns the subject unchanged if nothing matched, and `None` if the pattern
    /// failed to compile or the result could not be allocated. See
    /// [`crate::substitute`].
    #[instrument(level = "debug", skip_all, fields(flags = flags))]
    pub fn substitute<E: Environment + ?Sized>(
        &self,
        env: &mut E,
        pattern: impl AsRef<[u8]>,
        replacement: impl AsRef<[u8]>,
        subject: impl AsRef<[u8]>,
        flags: &str,
    ) -> Option<Vec<u8>> {
        let subject = subject.as_ref();
        let (pattern, behavior) = self.compile(env, pattern.as_ref(), flags, "subst")?;
        let template = Template::parse(replacement.as_ref(), &pattern);
        let result = subst::assemble(
            env,
            &pattern,
            &template,
            subject,
            behavior.contains(Behavior::GLOBAL),
        );
        let outcome = self.finish(env, result)?;
        debug!(matches = outcome.matches, "substituted");
        Some(outcome.output)
    }

    /// Parse `flags`, expand and compile `pattern`, and study it if asked to.
    ///
    /// On failure every positional slot is cleared.
    fn compile<E: Environment + ?Sized>(
        &self,
        env: &mut E,
        pattern: &[u8],
        flags: &str,
        context: &str,
    ) -> Option<(Pattern, Behavior)> {
        let parsed = options::parse(flags, context)
            .capabilities(self.capabilities)
            .call();
        for diagnostic in parsed.diagnostics {
            env.diagnostic(diagnostic);
        }

        let text = if parsed.behavior.contains(Behavior::EXPAND_PATTERN) {
            env.expand(pattern)
        } else {
            Cow::Borrowed(pattern)
        };
        let compiled = Pattern::builder()
            .options(parsed.options)
            .max_captures(self.max_captures)
            .backtrack(self.backtrack.clone())
            .build_from_bytes(&text);
        let mut compiled = match compiled {
            Ok(compiled) => compiled,
            Err(e) => {
                debug!(%e, "compile failed");
                env.diagnostic(e.into());
                unbind_positional_range(env, 0..self.max_captures);
                return None;
            }
        };

        if parsed.behavior.contains(Behavior::STUDY) {
            if let Err(e) = compiled.study(self.study_size_limit) {
                env.diagnostic(e.into());
            }
        }
        Some((compiled, parsed.behavior))
    }

    /// Clear the positional slots no match occupies, or all of them if the call
    /// failed.
    fn finish<E: Environment + ?Sized>(
        &self,
        env: &mut E,
        result: Result<Outcome, Error>,
    ) -> Option<Outcome> {
        match result {
            Ok(outcome) => {
                unbind_positional_range(env, outcome.bound..self.max_captures);
                Some(outcome)
            }
            Err(e) => {
                env.diagnostic(e.into());
                unbind_positional_range(env, 0..self.max_captures);
                None
            }
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn max_captures(&self) -> usize {
        self.max_captures
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        env::Bindings,
        error::{Error, Level},
    };

    use super::*;

    #[test]
    fn compile_failure() {
        let engine = Engine::default();
        let mut env = Bindings::new();
        env.bind_positional(1, Some(b"stale"));

        assert_eq!(engine.find(&mut env, "a(b", "ab", "g"), None);
        assert_eq!(env.positional(1), None);
        assert_eq!(env.diagnostics().len(), 1);
        assert!(matches!(
            env.diagnostics()[0].error,
            Error::Compile { offset: Some(1), .. }
        ));

        assert_eq!(engine.substitute(&mut env, b"a\xFF", "", "ab", ""), None);
        assert!(matches!(
            env.diagnostics()[1].error,
            Error::Compile { offset: Some(1), .. }
        ));
    }

    #[test]
    fn unknown_option() {
        let engine = Engine::default();
        let mut env = Bindings::new();
        assert_eq!(engine.find(&mut env, "b", "abc", "qg"), Some(b"b".to_vec()));
        assert_eq!(env.diagnostics().len(), 1);
        assert_eq!(env.diagnostics()[0].to_string(), "error: find: unknown option 'q'");

        let mut env = Bindings::new();
        assert_eq!(
            engine.substitute(&mut env, "b", "x", "abc", "q"),
            Some(b"axc".to_vec())
        );
        assert_eq!(env.diagnostics()[0].to_string(), "error: subst: unknown option 'q'");
    }

    #[test]
    fn unbind_beyond_last_match() {
        let engine = Engine::builder().max_captures(4).build();
        let mut env = Bindings::new();
        assert!(engine.find(&mut env, r"(a)(b)(c)", "abc", "").is_some());
        assert_eq!(env.positional(3), Some(&b"c"[..]));

        assert!(engine.find(&mut env, r"(x)", "x", "").is_some());
        assert_eq!(env.positional(0), Some(&b"x"[..]));
        assert_eq!(env.positional(1), Some(&b"x"[..]));
        assert_eq!(env.positional(2), None);
        assert_eq!(env.positional(3), None);

        assert_eq!(engine.find(&mut env, r"(y)", "x", ""), None);
        assert_eq!(env.positional(0), None);
        assert_eq!(env.positional(1), None);
        assert!(env.diagnostics().is_empty());
    }

    #[test]
    fn max_captures() {
        let engine = Engine::builder().max_captures(2).build();
        let mut env = Bindings::new();
        assert_eq!(
            engine.substitute(&mut env, r"(a)(b)", r"\2\1", "ab", ""),
            Some(b"a".to_vec())
        );
        assert_eq!(env.positional(1), Some(&b"a"[..]));
        assert_eq!(env.positional(2), None);
    }

    #[test]
    fn study() {
        let engine = Engine::default();
        let mut env = Bindings::new();
        assert_eq!(
            engine.substitute(&mut env, r"(\w+)@(\w+)", r"\2 at \1", "mail me@host now", "gS"),
            Some(b"mail host at me now".to_vec())
        );
        assert!(env.diagnostics().is_empty());

        let engine = Engine::builder().study_size_limit(1).build();
        assert_eq!(
            engine.find(&mut env, r"\w+", "ab cd", "gS"),
            Some(b"ab cd".to_vec())
        );
        assert_eq!(env.diagnostics().len(), 1);
        assert_eq!(env.diagnostics()[0].level, Level::Warning);
    }

    #[test]
    fn expand_pattern() {
        let engine = Engine::default();
        let mut env = Bindings::new();
        env.define("word", "[a-z]+");
        assert_eq!(
            engine.find(&mut env, "$(word)", "12 ab", "e"),
            Some(b"ab".to_vec())
        );
        // Without `e` the reference is pattern text
        assert_eq!(engine.find(&mut env, "$(word)", "12 ab", ""), None);
    }

    #[test]
    fn match_error() {
        let engine = Engine::builder()
            .backtrack(backtrack::Config::new().visited_capacity(1))
            .build();
        let mut env = Bindings::new();
        let subject = "x".repeat(1000);
        assert_eq!(engine.find(&mut env, "y", &subject, "g"), None);
        assert!(matches!(env.diagnostics()[0].error, Error::Match { offset: 0, .. }));
        assert_eq!(env.positional(0), None);

        // A failed search is not a failed substitution
        assert_eq!(
            engine.substitute(&mut env, "y", "z", &subject, "g"),
            Some(subject.clone().into_bytes())
        );
    }
}

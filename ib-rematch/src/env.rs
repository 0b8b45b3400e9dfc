/*!
The binding environment: the host the engine is embedded in.

The engine pushes capture values into it as positional (`1`, `2`, ...) and named
variables, reports diagnostics to it, and asks it to expand pattern text when the
`e` option is given.

[`Bindings`] is an in-memory environment that records everything it receives.
It is what the crate-level [`find`](crate::find) and [`substitute`](crate::substitute)
examples use, and it is a reasonable starting point for hosts that only need to
look the values up afterwards.
*/
use std::{borrow::Cow, collections::BTreeMap};

use bstr::ByteSlice;
use tracing::{error, warn};

use crate::error::{Diagnostic, Level};

pub trait Environment {
    /// Expand host placeholders in pattern text.
    ///
    /// Only called on patterns, and only with the `e` option. Subjects and
    /// replacements are expected to be expanded by the caller already.
    fn expand<'t>(&mut self, text: &'t [u8]) -> Cow<'t, [u8]> {
        Cow::Borrowed(text)
    }

    /// `None` means the group did not participate in the match, which is
    /// different from matching empty text.
    fn bind_positional(&mut self, index: usize, value: Option<&[u8]>);

    fn bind_named(&mut self, name: &str, value: &[u8]);

    /// Clear a positional slot that no match occupies.
    fn unbind_positional(&mut self, index: usize) {
        self.bind_positional(index, None)
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic);
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn expand<'t>(&mut self, text: &'t [u8]) -> Cow<'t, [u8]> {
        (**self).expand(text)
    }

    fn bind_positional(&mut self, index: usize, value: Option<&[u8]>) {
        (**self).bind_positional(index, value)
    }

    fn bind_named(&mut self, name: &str, value: &[u8]) {
        (**self).bind_named(name, value)
    }

    fn unbind_positional(&mut self, index: usize) {
        (**self).unbind_positional(index)
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        (**self).diagnostic(diagnostic)
    }
}

/// Clear positional slots `range`, e.g. those beyond the last match's groups.
pub(crate) fn unbind_positional_range<E: Environment + ?Sized>(
    env: &mut E,
    range: std::ops::Range<usize>,
) {
    for i in range {
        env.unbind_positional(i);
    }
}

/// An in-memory [`Environment`].
///
/// ## Expansion
/// [`Environment::expand`] replaces `$(name)` and `${name}` with the value of the
/// variable `name`, and `$$` with `$`. Variables are looked up in the ones
/// [`define`](Bindings::define)d, then in the named and positional bindings.
/// Undefined variables expand to nothing.
/// ```
/// use ib_rematch::{env::Bindings, find};
///
/// let mut env = Bindings::new();
/// env.define("year", "20[0-9]{2}");
/// assert_eq!(find(&mut env, "$(year)", "since 2024", "e"), Some(b"2024".to_vec()));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    variables: BTreeMap<String, Vec<u8>>,
    positional: Vec<Option<Vec<u8>>>,
    named: BTreeMap<String, Vec<u8>>,
    diagnostics: Vec<Diagnostic>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a variable for [`Environment::expand`].
    pub fn define(&mut self, name: impl Into<String>, value: impl AsRef<[u8]>) {
        self.variables.insert(name.into(), value.as_ref().to_vec());
    }

    pub fn positional(&self, index: usize) -> Option<&[u8]> {
        self.positional.get(index)?.as_deref()
    }

    /// The number of positional slots ever touched, bound or not.
    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    pub fn named(&self, name: &str) -> Option<&[u8]> {
        self.named.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    fn lookup(&self, name: &[u8]) -> Option<&[u8]> {
        let name = name.to_str().ok()?;
        if let Some(value) = self.variables.get(name) {
            return Some(value.as_slice());
        }
        if let Some(value) = self.named.get(name) {
            return Some(value.as_slice());
        }
        name.parse::<usize>().ok().and_then(|i| self.positional(i))
    }
}

impl Environment for Bindings {
    fn expand<'t>(&mut self, text: &'t [u8]) -> Cow<'t, [u8]> {
        if !text.contains(&b'$') {
            return Cow::Borrowed(text);
        }

        let mut out = Vec::with_capacity(text.len());
        let mut rest = text;
        while let Some(i) = rest.find_byte(b'$') {
            out.extend_from_slice(&rest[..i]);
            rest = &rest[i + 1..];
            let close = match rest.first() {
                Some(b'$') => {
                    out.push(b'$');
                    rest = &rest[1..];
                    continue;
                }
                Some(b'(') => b')',
                Some(b'{') => b'}',
                _ => {
                    // Not a reference
                    out.push(b'$');
                    continue;
                }
            };
            match rest.find_byte(close) {
                Some(end) => {
                    if let Some(value) = self.lookup(&rest[1..end]) {
                        out.extend_from_slice(value);
                    }
                    rest = &rest[end + 1..];
                }
                None => {
                    // Unterminated reference, kept as is
                    out.push(b'$');
                }
            }
        }
        out.extend_from_slice(rest);
        Cow::Owned(out)
    }

    fn bind_positional(&mut self, index: usize, value: Option<&[u8]>) {
        if index >= self.positional.len() {
            if value.is_none() {
                // Never bound, nothing to clear
                return;
            }
            self.positional.resize(index + 1, None);
        }
        self.positional[index] = value.map(<[u8]>::to_vec);
    }

    fn bind_named(&mut self, name: &str, value: &[u8]) {
        self.named.insert(name.to_owned(), value.to_vec());
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Error => error!("{}", diagnostic.error),
            Level::Warning => warn!("{}", diagnostic.error),
        }
        self.diagnostics.push(diagnostic);
    }
}

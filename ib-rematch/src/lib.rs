/*!
A regex match and substitution engine for embedding in build tools and scripting hosts.

## Features
- Compact option strings, e.g. `"gi"`, with unknown options reported instead of failing. See [`options`].
- Find the first match or every match, with zero-length matches that never loop forever.
- Capture groups bound into the host as positional (`0`, `1`, ...) and named variables.
  A group that did not participate is unbound, not empty.
- Substitution with `\1`, `\g{name}` replacement templates.
- Byte-oriented by default, with opt-in Unicode (`u`) and UTF-8 (`8`) modes.
- Optional study (`S`) of patterns into DFAs for faster global searches.
- Allocation failures are reported instead of aborting.

The pattern syntax is the same as the [`regex`](https://docs.rs/regex/) crate.

The engine talks to its host through an [`Environment`]. [`Bindings`] is an in-memory one.
*/
//! ## Usage
//! ```
//! use ib_rematch::{find, substitute, Bindings};
//!
//! let mut env = Bindings::new();
//! assert_eq!(
//!     find(&mut env, r"(?<year>\d{4})-(\d{2})", "since 2024-01", ""),
//!     Some(b"2024-01".to_vec())
//! );
//! assert_eq!(env.named("year"), Some(&b"2024"[..]));
//! assert_eq!(env.positional(2), Some(&b"01"[..]));
//!
//! assert_eq!(
//!     substitute(&mut env, r"(\d+)", r"[\1]", "x12y34z", "g"),
//!     Some(b"x[12]y[34]z".to_vec())
//! );
//! assert!(env.diagnostics().is_empty());
//! ```
//!
//! ## Crate features
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod buffer;
pub mod capture;
mod engine;
pub mod env;
mod error;
pub mod iter;
pub mod options;
pub mod regex;
pub mod subst;

pub use engine::{Engine, EngineBuilder};
pub use env::{Bindings, Environment};
pub use error::{Diagnostic, Error, Feature, Level};

/// Find the first match of `pattern` in `subject`, or with the `g` option every
/// match, joined by single spaces. Uses the default [`Engine`].
///
/// Returns `None` if nothing matched or the pattern failed to compile; the
/// latter is reported to `env`. Empty matches count: they contribute empty text
/// between the separators.
///
/// Captures of every match are bound into `env`. Named groups that did not
/// participate are left alone, so with `g` a name keeps the value of the last
/// match it participated in. Positional slots are those of the last match, and
/// every slot beyond them up to [`regex::MAX_CAPTURES`] is unbound.
pub fn find<E: Environment + ?Sized>(
    env: &mut E,
    pattern: impl AsRef<[u8]>,
    subject: impl AsRef<[u8]>,
    flags: &str,
) -> Option<Vec<u8>> {
    Engine::default().find(env, pattern, subject, flags)
}

/// Replace the first match of `pattern` in `subject`, or with the `g` option every
/// match, by `replacement`. Uses the default [`Engine`].
///
/// `replacement` is a [`subst::Template`], expanded with the captures of each
/// match, which are bound into `env` the same way as [`find`] does.
///
/// Returns the subject unchanged if nothing matched, and `None` if the pattern
/// failed to compile or the result could not be allocated.
pub fn substitute<E: Environment + ?Sized>(
    env: &mut E,
    pattern: impl AsRef<[u8]>,
    replacement: impl AsRef<[u8]>,
    subject: impl AsRef<[u8]>,
    flags: &str,
) -> Option<Vec<u8>> {
    Engine::default().substitute(env, pattern, replacement, subject, flags)
}

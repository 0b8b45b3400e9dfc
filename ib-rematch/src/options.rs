/*!
Option strings.

Options are given as a compact string of single-character codes, e.g. `"gi"`:

<pre class="rust">
i     case-insensitive: letters match both upper and lower case
m     multi-line mode: ^ and $ match begin/end of line
s     allow . to match \n
x     extended mode, ignores whitespace and allows line comments (starting with `#`)
U     ungreedy: swap the meaning of x* and x*?
X     extra strictness: unknown escapes are errors
u     Unicode properties: \d, \w, \s, \b and case folding are Unicode-aware, \p{..} is available
8     UTF-8 mode: . matches a codepoint, matches never split a codepoint
A     anchored: every match must start where the search starts
D     $ matches only at the very end of the subject, never before a final \n
e     expand the pattern with the environment before compiling
g     global: find or substitute all matches instead of the first one
S     study: build extra optimization data for the pattern
</pre>

Without `u` and `8`, the engine is byte-oriented: `.` matches any byte except `\n`
and character classes are ASCII-only.

`X` and `D` are always in effect: the parser rejects unknown escapes, and outside of
multi-line mode `$` only matches at the end of the subject. The options are still
accepted and recorded. Note this differs from PCRE, where `$` without `D` also
matches before a `\n` that ends the subject: here `c$` does not match `"abc\n"`
with or without `D`. `c\n?\z` finds the same place, with the `\n` included in
the match.

Both `u` and `8` need the `unicode` crate feature. Without it they are dropped
with a warning, see [`Capabilities::detect()`].

## Example
```
use ib_rematch::options::{self, Behavior, CompileOptions};

let parsed = options::parse("gmq", "find").call();
assert_eq!(parsed.options, CompileOptions::MULTI_LINE);
assert_eq!(parsed.behavior, Behavior::GLOBAL);
assert_eq!(parsed.diagnostics[0].error.to_string(), "find: unknown option 'q'");
```
*/
use bitflags::bitflags;
use bon::builder;
use regex_automata::{nfa::thompson, util::syntax, Anchored};

use crate::error::{Diagnostic, Error, Feature};

bitflags! {
    /// Options that change what a pattern matches.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CompileOptions: u16 {
        const CASE_INSENSITIVE = 1 << 0;
        const MULTI_LINE = 1 << 1;
        const DOT_MATCHES_NEW_LINE = 1 << 2;
        const EXTENDED = 1 << 3;
        const UNGREEDY = 1 << 4;
        const EXTRA = 1 << 5;
        const UNICODE_PROPERTIES = 1 << 6;
        const UTF8 = 1 << 7;
        const ANCHORED = 1 << 8;
        const DOLLAR_END_ONLY = 1 << 9;
    }

    /// Options that change how the engine drives a pattern.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Behavior: u8 {
        const EXPAND_PATTERN = 1 << 0;
        const GLOBAL = 1 << 1;
        const STUDY = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flag {
    Compile(CompileOptions),
    Behavior(Behavior),
}

const FLAGS: [(char, Flag); 13] = [
    ('i', Flag::Compile(CompileOptions::CASE_INSENSITIVE)),
    ('m', Flag::Compile(CompileOptions::MULTI_LINE)),
    ('s', Flag::Compile(CompileOptions::DOT_MATCHES_NEW_LINE)),
    ('x', Flag::Compile(CompileOptions::EXTENDED)),
    ('U', Flag::Compile(CompileOptions::UNGREEDY)),
    ('X', Flag::Compile(CompileOptions::EXTRA)),
    ('u', Flag::Compile(CompileOptions::UNICODE_PROPERTIES)),
    ('8', Flag::Compile(CompileOptions::UTF8)),
    ('A', Flag::Compile(CompileOptions::ANCHORED)),
    ('D', Flag::Compile(CompileOptions::DOLLAR_END_ONLY)),
    ('e', Flag::Behavior(Behavior::EXPAND_PATTERN)),
    ('g', Flag::Behavior(Behavior::GLOBAL)),
    ('S', Flag::Behavior(Behavior::STUDY)),
];

fn lookup(c: char) -> Option<Flag> {
    FLAGS.iter().find(|(f, _)| *f == c).map(|&(_, flag)| flag)
}

/// What the engine build can do.
///
/// Options that need a missing capability are dropped with a warning instead of
/// failing the compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Unicode property tables. Needed by `u`.
    pub unicode_properties: bool,
    /// UTF-8 matching. Needed by `8`, which also turns on Unicode-aware syntax
    /// and so needs the same tables for `\d`, `\w` and case folding.
    pub utf8: bool,
}

impl Capabilities {
    /// The capabilities of this build of the crate.
    pub const fn detect() -> Self {
        Self {
            unicode_properties: cfg!(feature = "unicode"),
            utf8: cfg!(feature = "unicode"),
        }
    }

    /// Nothing optional is available.
    pub const fn none() -> Self {
        Self {
            unicode_properties: false,
            utf8: false,
        }
    }

    fn missing(&self, options: CompileOptions) -> Option<Feature> {
        if options.contains(CompileOptions::UNICODE_PROPERTIES) && !self.unicode_properties {
            Some(Feature::UnicodeProperties)
        } else if options.contains(CompileOptions::UTF8) && !self.utf8 {
            Some(Feature::Utf8)
        } else {
            None
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    pub options: CompileOptions,
    pub behavior: Behavior,
    /// Unknown and unsupported options, in order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse an option string.
///
/// `context` names the caller in diagnostics, e.g. `find: unknown option 'q'`.
/// A bad option never stops the parsing.
#[builder]
pub fn parse<'a>(
    #[builder(start_fn)] flags: &'a str,
    #[builder(start_fn)] context: &'a str,
    #[builder(default)] capabilities: Capabilities,
) -> ParsedOptions {
    let mut parsed = ParsedOptions::default();
    for c in flags.chars() {
        match lookup(c) {
            Some(Flag::Compile(option)) => match capabilities.missing(option) {
                Some(feature) => parsed.diagnostics.push(
                    Error::UnsupportedFeature {
                        context: context.to_owned(),
                        flag: c,
                        feature,
                    }
                    .into(),
                ),
                None => parsed.options |= option,
            },
            Some(Flag::Behavior(behavior)) => parsed.behavior |= behavior,
            None => parsed.diagnostics.push(
                Error::UnknownOption {
                    context: context.to_owned(),
                    flag: c,
                }
                .into(),
            ),
        }
    }
    parsed
}

impl CompileOptions {
    /// Whether the pattern is Unicode-aware. Either `u` or `8` turns it on.
    pub fn is_unicode(&self) -> bool {
        self.intersects(Self::UNICODE_PROPERTIES | Self::UTF8)
    }

    pub fn is_utf8(&self) -> bool {
        self.contains(Self::UTF8)
    }

    /// Syntax config for parsing patterns.
    pub fn syntax(&self) -> syntax::Config {
        syntax::Config::new()
            .case_insensitive(self.contains(Self::CASE_INSENSITIVE))
            .multi_line(self.contains(Self::MULTI_LINE))
            .dot_matches_new_line(self.contains(Self::DOT_MATCHES_NEW_LINE))
            .ignore_whitespace(self.contains(Self::EXTENDED))
            .swap_greed(self.contains(Self::UNGREEDY))
            .unicode(self.is_unicode())
            .utf8(self.is_utf8())
    }

    /// Thompson NFA config. In UTF-8 mode empty matches never split a codepoint.
    pub fn thompson(&self) -> thompson::Config {
        thompson::Config::new().utf8(self.is_utf8())
    }

    pub fn anchored(&self) -> Anchored {
        if self.contains(Self::ANCHORED) {
            Anchored::Yes
        } else {
            Anchored::No
        }
    }

    /// The option characters for these options, in canonical order.
    pub fn to_flags(&self) -> String {
        FLAGS
            .iter()
            .filter_map(|&(c, flag)| match flag {
                Flag::Compile(option) if self.contains(option) => Some(c),
                _ => None,
            })
            .collect()
    }
}

/*!
Substitution: rebuilding a subject with its matches replaced.

Each match is replaced by its [`Template`] expansion, the text between matches is
copied as is. After an empty match the character following it is copied too, so
no character of the subject is ever dropped.
*/
use tracing::trace;

use crate::{
    buffer::OutputBuffer,
    capture,
    env::Environment,
    error::Error,
    iter::{Matches, Outcome},
    regex::Pattern,
};

mod template;

pub use template::Template;

/// Replace the first match, or every match if `global`, of `pattern` in `subject`.
///
/// Captures of every match are bound into `env` before its replacement is
/// expanded. A failed search ends the substitution with what has been replaced
/// so far and the rest of the subject copied unchanged.
pub(crate) fn assemble<E: Environment + ?Sized>(
    env: &mut E,
    pattern: &Pattern,
    template: &Template,
    subject: &[u8],
    global: bool,
) -> Result<Outcome, Error> {
    let mut out = OutputBuffer::with_capacity(subject.len())?;
    let mut outcome = Outcome::default();
    let mut cursor = 0;
    for groups in Matches::new(pattern, subject, global) {
        let groups = match groups {
            Ok(groups) => groups,
            Err(e) => {
                env.diagnostic(e.into());
                break;
            }
        };
        let m = groups.get_match();
        let caps = capture::extract(pattern, subject, &groups);
        outcome.bound = caps.bind_to(env);
        outcome.matches += 1;

        // The character skipped after an empty match is part of this gap
        out.push(&subject[cursor..m.start])?;
        template.expand(&caps, &mut out)?;
        cursor = m.end;
    }
    out.push(&subject[cursor..])?;
    trace!(matches = outcome.matches, len = out.len(), "substituted");

    outcome.output = out.into_inner();
    Ok(outcome)
}

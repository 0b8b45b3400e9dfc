use bstr::ByteSlice;

use crate::{buffer::OutputBuffer, capture::Captures, error::Error, regex::Pattern};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece {
    Literal(Vec<u8>),
    Group(usize),
}

/// A parsed replacement.
///
/// - `\N`: group `N`, a single digit. `\0` is the whole match.
/// - `\NN`: group `NN`, if the pattern has that many groups. Otherwise `\N`
///   followed by the digit.
/// - `\g{N}`, `\g{name}`: group by index or name.
/// - `\\`: a backslash.
///
/// Every other backslash is literal, as is a reference to a name the pattern
/// does not have. A group that did not participate expands to nothing.
///
/// ```
/// use ib_rematch::{regex::Pattern, subst::Template};
///
/// let pattern = Pattern::new(r"(?<k>\w+)=(\w+)")?;
/// let template = Template::parse(br"\2=\g{k} \\n \n", &pattern);
/// assert_eq!(template.references().collect::<Vec<_>>(), [2, 1]);
/// # Ok::<(), ib_rematch::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    pub fn parse(replacement: &[u8], pattern: &Pattern) -> Self {
        let group_len = pattern.group_len();
        let mut pieces = Vec::new();
        let mut literal = Vec::new();
        let mut rest = replacement;
        while let Some(i) = rest.find_byte(b'\\') {
            literal.extend_from_slice(&rest[..i]);
            rest = &rest[i + 1..];
            match reference(rest, pattern, group_len) {
                Some((Reference::Backslash, len)) => {
                    literal.push(b'\\');
                    rest = &rest[len..];
                }
                Some((Reference::Group(group), len)) => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Group(group));
                    rest = &rest[len..];
                }
                None => literal.push(b'\\'),
            }
        }
        literal.extend_from_slice(rest);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Self { pieces }
    }

    /// Whether the replacement is the same for every match.
    pub fn is_literal(&self) -> bool {
        self.references().next().is_none()
    }

    /// The groups referenced, in order.
    pub fn references(&self) -> impl Iterator<Item = usize> + '_ {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Group(group) => Some(*group),
            Piece::Literal(_) => None,
        })
    }

    pub fn expand(&self, caps: &Captures, out: &mut OutputBuffer) -> Result<(), Error> {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(literal) => out.push(literal)?,
                Piece::Group(group) => {
                    if let Some(value) = caps.get(*group) {
                        out.push(value)?
                    }
                }
            }
        }
        Ok(())
    }
}

enum Reference {
    Backslash,
    Group(usize),
}

/// Parse the reference after a backslash. Returns it and its length.
fn reference(s: &[u8], pattern: &Pattern, group_len: usize) -> Option<(Reference, usize)> {
    match *s.first()? {
        b'\\' => Some((Reference::Backslash, 1)),
        d @ b'0'..=b'9' => {
            let group = usize::from(d - b'0');
            match s.get(1).copied() {
                Some(d2 @ b'0'..=b'9') if group * 10 + usize::from(d2 - b'0') < group_len => {
                    Some((Reference::Group(group * 10 + usize::from(d2 - b'0')), 2))
                }
                _ => Some((Reference::Group(group), 1)),
            }
        }
        b'g' if s.get(1) == Some(&b'{') => {
            let end = s.find_byte(b'}')?;
            let name = s[2..end].to_str().ok()?;
            let group = if name.bytes().all(|b| b.is_ascii_digit()) {
                name.parse().ok()?
            } else {
                pattern.names().get(name)?
            };
            Some((Reference::Group(group), end + 1))
        }
        _ => None,
    }
}

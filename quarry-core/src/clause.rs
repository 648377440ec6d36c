use crate::{GenericSqlWriter, Selector, SqlWriter};
use std::{
    convert::Infallible,
    fmt::{self, Display},
    str::FromStr,
};

/// How the entries of a [`Selector`] combine into a predicate.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    /// `a = @a AND b = @b`
    #[default]
    And,
    /// `a = @a OR b = @b`
    Or,
    /// `a IN (@a), b IN (@b)`, one fragment per entry.
    In,
    /// Matches nothing: `0 = 1`.
    Never,
}

impl FromStr for Clause {
    type Err = Infallible;

    /// Case insensitive. Unknown names give [`Clause::Never`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            v if v.eq_ignore_ascii_case("and") => Clause::And,
            v if v.eq_ignore_ascii_case("or") => Clause::Or,
            v if v.eq_ignore_ascii_case("in") => Clause::In,
            _ => Clause::Never,
        })
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Clause::And => "AND",
            Clause::Or => "OR",
            Clause::In => "IN",
            Clause::Never => "NEVER",
        })
    }
}

/// Predicate text for `selector`, with unquoted identifiers and `@` parameters.
pub fn build_predicate(selector: &Selector, clause: Clause) -> String {
    let mut out = String::with_capacity(64);
    GenericSqlWriter::new().write_predicate(&mut out, &selector.normalize(), clause);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector;

    #[test]
    fn and_or() {
        let selector = selector! { A: 1, B: 2 };
        assert_eq!(build_predicate(&selector, Clause::And), "A = @A AND B = @B");
        assert_eq!(build_predicate(&selector, Clause::Or), "A = @A OR B = @B");
        assert_eq!(build_predicate(&selector, Clause::default()), "A = @A AND B = @B");
    }

    #[test]
    fn in_fragments() {
        assert_eq!(build_predicate(&selector! { A: 1 }, Clause::In), "A IN (@A)");
        assert_eq!(
            build_predicate(&selector! { A: 1, B: 2 }, Clause::In),
            "A IN (@A), B IN (@B)"
        );
    }

    #[test]
    fn matches_nothing() {
        assert_eq!(build_predicate(&Selector::new(), Clause::And), "0 = 1");
        assert_eq!(build_predicate(&Selector::new(), Clause::In), "0 = 1");
        assert_eq!(build_predicate(&selector! { A: 1 }, Clause::Never), "0 = 1");
    }

    #[test]
    fn sigils_are_stripped() {
        let selector = Selector::new().with("@Id", 1).with(":Name", "x");
        assert_eq!(build_predicate(&selector, Clause::And), "Id = @Id AND Name = @Name");
    }

    #[test]
    fn names_with_spaces() {
        let selector = Selector::new().with("first name", "x").with("first_name", "y");
        assert_eq!(
            build_predicate(&selector, Clause::And),
            "first name = @first_name AND first_name = @first_name_2"
        );
    }

    #[test]
    fn parse() {
        assert_eq!("and".parse(), Ok(Clause::And));
        assert_eq!("OR".parse(), Ok(Clause::Or));
        assert_eq!(" In ".parse(), Ok(Clause::In));
        assert_eq!("xor".parse(), Ok(Clause::Never));
        assert_eq!("".parse(), Ok(Clause::Never));
    }
}

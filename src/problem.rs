//! Plain-text description of a truss problem.
//!
//! The format is a stream of whitespace-separated tokens:
//!
//! ```text
//! <joints> <members> <loads>
//! <x> <y> <free T/F> <highest T/F>     (once per joint)
//! <joint> <joint>                      (once per member)
//! <joint> <magnitude>                  (once per load)
//! ```

use std::str::FromStr;

use crate::errors::ProblemError;
use crate::truss::Truss;

/// Cursor over the tokens of a problem description.
struct Tokens<'a> {
    /// Remaining whitespace-separated tokens.
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    /// Split `text` into tokens.
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }

    /// Next raw token.
    fn next_token(&mut self, expected: &'static str) -> Result<&'a str, ProblemError> {
        self.inner
            .next()
            .ok_or(ProblemError::UnexpectedEnd { expected })
    }

    /// Next token parsed as a number.
    fn number<T: FromStr>(&mut self, expected: &'static str) -> Result<T, ProblemError> {
        let token = self.next_token(expected)?;
        token.parse().map_err(|_| ProblemError::InvalidNumber {
            expected,
            token: token.to_owned(),
        })
    }

    /// Next token read as a `T`/`F` flag, case-insensitively.
    fn flag(&mut self, expected: &'static str) -> Result<bool, ProblemError> {
        match self.next_token(expected)? {
            "T" | "t" => Ok(true),
            "F" | "f" => Ok(false),
            token => Err(ProblemError::InvalidFlag {
                expected,
                token: token.to_owned(),
            }),
        }
    }
}

/// Build a [`Truss`] from its text description.
///
/// # Errors
///
/// Returns [`ProblemError`] when the text is truncated, holds a malformed
/// token, or describes members and loads on joints that do not exist.
///
/// # Examples
/// ```
/// let truss = trussopt::parse_problem("3 2 1\n0 0 F F\n4 0 F F\n2 3 T F\n0 2\n1 2\n2 -10")?;
/// assert_eq!(truss.joint_count(), 3);
/// assert_eq!(truss.free_joints(), &[2]);
/// assert_eq!(truss.joint_load(2), Some(-10.0));
/// # Ok::<(), trussopt::ProblemError>(())
/// ```
pub fn parse_problem(text: &str) -> Result<Truss, ProblemError> {
    let mut tokens = Tokens::new(text);
    let joints: usize = tokens.number("joint count")?;
    let members: usize = tokens.number("member count")?;
    let loads: usize = tokens.number("load count")?;

    let mut truss = Truss::new();
    for _ in 0..joints {
        let x = tokens.number("joint x coordinate")?;
        let y = tokens.number("joint y coordinate")?;
        let free = tokens.flag("free joint flag")?;
        let highest = tokens.flag("highest joint flag")?;
        truss.add_joint(x, y, free, highest);
    }
    for _ in 0..members {
        let a = tokens.number("member start joint")?;
        let b = tokens.number("member end joint")?;
        truss.add_member(a, b)?;
    }
    for _ in 0..loads {
        let joint = tokens.number("loaded joint")?;
        let magnitude = tokens.number("load magnitude")?;
        truss.add_load(joint, magnitude)?;
    }
    Ok(truss)
}

use crate::error::{Error, ErrorKind};
use derive_more::Display;
use std::str::FromStr;

/// What to do with pages carrying a known hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Action {
    /// Remove matching pages without asking.
    #[display("DELETE_AUTO")]
    DeleteAuto,
    /// Flag matching pages for someone to review and remove.
    #[display("DELETE_MANUAL")]
    DeleteManual,
    /// Known, and deliberately left alone.
    #[display("IGNORE")]
    Ignore,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::DeleteAuto, Action::DeleteManual, Action::Ignore];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteAuto => "DELETE_AUTO",
            Self::DeleteManual => "DELETE_MANUAL",
            Self::Ignore => "IGNORE",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::ALL.into_iter().find(|action| action.as_str().eq_ignore_ascii_case(s)) {
            Some(action) => Ok(action),
            None => exn::bail!(ErrorKind::InvalidData("action")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("DELETE_AUTO", Action::DeleteAuto)]
    #[case("delete_manual", Action::DeleteManual)]
    #[case("Ignore", Action::Ignore)]
    fn test_parse(#[case] input: &str, #[case] expected: Action) {
        assert_eq!(input.parse::<Action>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown() {
        assert!("DELETE".parse::<Action>().is_err());
    }

    #[test]
    fn test_display_matches_stored_form() {
        for action in Action::ALL {
            assert_eq!(action.to_string(), action.as_str());
        }
    }
}

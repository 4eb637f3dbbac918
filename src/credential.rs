use std::fmt;

/// An alternate account to act as. `None` at call sites means the
/// caller's ambient identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub account: String,
}

impl Credential {
    /// Blank input means "use the ambient identity".
    pub fn from_input(input: &str) -> Option<Self> {
        let account = input.trim();
        if account.is_empty() {
            None
        } else {
            Some(Credential {
                account: account.to_string(),
            })
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.account)
    }
}

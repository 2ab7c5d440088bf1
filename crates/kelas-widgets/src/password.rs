//! Password strength meter for the profile page's "change password" form.
//!
//! Five rules, one point each. The meter only advises; nothing is
//! rejected because of it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordRule {
    /// At least 8 characters.
    Length,
    /// An ASCII upper-case letter.
    Upper,
    /// An ASCII lower-case letter.
    Lower,
    /// An ASCII digit.
    Number,
    /// Anything that isn't an ASCII letter or digit.
    Special,
}

impl PasswordRule {
    pub const ALL: [Self; 5] = [
        Self::Length,
        Self::Upper,
        Self::Lower,
        Self::Number,
        Self::Special,
    ];

    pub const MIN_LENGTH: usize = 8;

    pub fn is_met(self, password: &str) -> bool {
        match self {
            Self::Length => password.chars().count() >= Self::MIN_LENGTH,
            Self::Upper => password.chars().any(|c| c.is_ascii_uppercase()),
            Self::Lower => password.chars().any(|c| c.is_ascii_lowercase()),
            Self::Number => password.chars().any(|c| c.is_ascii_digit()),
            Self::Special => password.chars().any(|c| !c.is_ascii_alphanumeric()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthLevel {
    Weak,
    Medium,
    Strong,
}

impl StrengthLevel {
    pub fn from_score(score: usize) -> Self {
        match score {
            0..=2 => Self::Weak,
            3..=4 => Self::Medium,
            _ => Self::Strong,
        }
    }
}

/// Result of scoring one password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordCheck {
    /// Rules the password meets, in [`PasswordRule::ALL`] order.
    pub met: Vec<PasswordRule>,
    /// Colors the first `strength()` bars of the meter.
    pub level: StrengthLevel,
}

impl PasswordCheck {
    /// Number of rules met, 0..=5.
    pub fn strength(&self) -> usize {
        self.met.len()
    }

    pub fn is_met(&self, rule: PasswordRule) -> bool {
        self.met.contains(&rule)
    }
}

pub fn check_strength(password: &str) -> PasswordCheck {
    let met: Vec<_> = PasswordRule::ALL
        .into_iter()
        .filter(|rule| rule.is_met(password))
        .collect();
    let level = StrengthLevel::from_score(met.len());
    PasswordCheck { met, level }
}

/// Whether the confirmation field agrees with the new password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordMatch {
    /// Confirmation field is empty; show nothing.
    Empty,
    Match,
    Mismatch,
}

impl PasswordMatch {
    /// Text under the confirmation field.
    pub fn message(self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Match => "✓ Password cocok",
            Self::Mismatch => "✗ Password tidak cocok",
        }
    }
}

pub fn check_match(new_password: &str, confirmation: &str) -> PasswordMatch {
    if confirmation.is_empty() {
        PasswordMatch::Empty
    } else if new_password == confirmation {
        PasswordMatch::Match
    } else {
        PasswordMatch::Mismatch
    }
}

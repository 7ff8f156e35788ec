use crate::IDENTITY_INDEX_WIDTH;
use serde::{Deserialize, Serialize};

/// A synthetic bidder account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub index: u32,
    pub login: String,
    pub password: String,
}

/// The range of synthetic accounts virtual users are mapped onto.
///
/// Virtual users are assigned accounts cyclically, so a run with more users than
/// accounts reuses the pool from the start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityPool {
    pub prefix: String,
    pub domain: String,
    pub suffix: Option<String>,
    pub index_min: u32,
    pub index_max: u32,
}

impl IdentityPool {
    /// Number of distinct accounts in the pool. An inverted range collapses to a
    /// single account.
    pub fn span(&self) -> u32 {
        if self.index_max < self.index_min {
            1
        } else {
            let span = u64::from(self.index_max) - u64::from(self.index_min) + 1;
            u32::try_from(span).unwrap_or(u32::MAX)
        }
    }

    /// Account index for a 1-based virtual user ordinal.
    pub fn index_for(&self, ordinal: u32) -> u32 {
        let offset = ordinal.saturating_sub(1) % self.span();
        self.index_min.saturating_add(offset)
    }

    pub fn login_for(&self, index: u32) -> String {
        let suffix = match self.suffix.as_deref() {
            Some(suffix) if !suffix.is_empty() => format!("-{suffix}"),
            _ => String::new(),
        };
        format!(
            "{}{:0width$}{}@{}",
            self.prefix,
            index,
            suffix,
            self.domain,
            width = IDENTITY_INDEX_WIDTH
        )
    }

    pub fn allocate(&self, ordinal: u32, password: &str) -> Identity {
        let index = self.index_for(ordinal);
        Identity {
            index,
            login: self.login_for(index),
            password: password.to_string(),
        }
    }
}

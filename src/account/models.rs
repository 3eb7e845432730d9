//! Account and player records.

use chrono::{DateTime, Utc};

/// Permission level, ordered: banned < normal < admin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Permission {
    Banned,
    Normal,
    Admin,
}

impl Permission {
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Banned => -1,
            Self::Normal => 0,
            Self::Admin => 1,
        }
    }

    #[must_use]
    pub const fn from_i16(value: i16) -> Self {
        match value {
            v if v < 0 => Self::Banned,
            0 => Self::Normal,
            _ => Self::Admin,
        }
    }
}

#[derive(Clone, Debug)]
pub struct User {
    pub uid: i64,
    pub email: String,
    pub nickname: String,
    /// Argon2 PHC string; never the raw credential.
    pub password: String,
    pub score: i64,
    pub permission: Permission,
    pub verified: bool,
    /// Address the account was registered from.
    pub ip: String,
    pub register_at: DateTime<Utc>,
}

/// Data needed to create a new account row.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub score: i64,
    pub permission: Permission,
    pub verified: bool,
    pub ip: String,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pid: i64,
    /// Owning account; `None` until the name is claimed.
    pub uid: Option<i64>,
    pub name: String,
    pub tid_skin: i64,
    pub tid_cape: i64,
}

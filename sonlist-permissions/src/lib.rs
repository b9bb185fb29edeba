//! Permission evaluation for sonlist lists.
//!
//! Every list carries three permission strings: `confperm` (configure),
//! `writeperm` (write items) and `readperm` (read). Each is either `@all`,
//! `@listowner`, or a comma-separated list of identities. Evaluation is a
//! pure function of the caller, the list owner and those strings:
//!
//! 1. the administrator and the list owner are always allowed;
//! 2. a non-anonymous caller is allowed by `confperm`, then `writeperm`;
//! 3. anyone, anonymous included, is allowed by `readperm`;
//! 4. otherwise the request is forbidden.
//!
//! [`Access`] selects which of the strings take part, so a `readperm` grant
//! never lets a caller write.

mod error;

pub use error::{PermissionError, PermissionResult};

use sonlist_types::fields::{
    DEFAULT_ADMIN_IDENTITY, DEFAULT_ANONYMOUS_IDENTITY, PERM_ALL, PERM_LIST_OWNER,
};

/// The kind of access a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Change or delete the list itself. Granted by `confperm` only.
    Configure,
    /// Create, patch or delete items. Granted by `confperm` or `writeperm`.
    Write,
    /// Fetch the list or its items. Granted by any of the three.
    Read,
}

impl Access {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Write => "write to",
            Self::Read => "read",
        }
    }
}

/// The permission-relevant fields of one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPermissions<'a> {
    pub owner: &'a str,
    pub conf: &'a str,
    pub write: &'a str,
    pub read: &'a str,
}

impl<'a> ListPermissions<'a> {
    /// The permission strings that can grant `access`, absent ones as `None`.
    fn for_access(&self, access: Access) -> (Option<&'a str>, Option<&'a str>, Option<&'a str>) {
        match access {
            Access::Configure => (Some(self.conf), None, None),
            Access::Write => (Some(self.conf), Some(self.write), None),
            Access::Read => (Some(self.conf), Some(self.write), Some(self.read)),
        }
    }
}

/// Decides whether an identity may act on a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEvaluator {
    admin: String,
    anonymous: String,
}

impl Default for PermissionEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_IDENTITY, DEFAULT_ANONYMOUS_IDENTITY)
    }
}

impl PermissionEvaluator {
    pub fn new(admin: impl Into<String>, anonymous: impl Into<String>) -> Self {
        Self {
            admin: admin.into(),
            anonymous: anonymous.into(),
        }
    }

    pub fn admin(&self) -> &str {
        &self.admin
    }

    pub fn anonymous(&self) -> &str {
        &self.anonymous
    }

    pub fn is_admin(&self, user: &str) -> bool {
        user == self.admin
    }

    pub fn is_anonymous(&self, user: &str) -> bool {
        user == self.anonymous
    }

    /// Evaluates the three permission strings, first match wins.
    ///
    /// An absent string grants nothing.
    pub fn validate_perm(
        &self,
        user: &str,
        owner: &str,
        conf: Option<&str>,
        write: Option<&str>,
        read: Option<&str>,
    ) -> PermissionResult<()> {
        if self.allows(user, owner, conf, write, read) {
            Ok(())
        } else {
            Err(PermissionError::Forbidden {
                user: user.to_string(),
                access: strongest(conf, write),
            })
        }
    }

    /// Checks `access` against a list's permissions.
    pub fn check(&self, user: &str, list: &ListPermissions<'_>, access: Access) -> PermissionResult<()> {
        let (conf, write, read) = list.for_access(access);
        if self.allows(user, list.owner, conf, write, read) {
            Ok(())
        } else {
            Err(PermissionError::Forbidden {
                user: user.to_string(),
                access: access.verb(),
            })
        }
    }

    fn allows(
        &self,
        user: &str,
        owner: &str,
        conf: Option<&str>,
        write: Option<&str>,
        read: Option<&str>,
    ) -> bool {
        if self.is_admin(user) || user == owner {
            return true;
        }
        if !self.is_anonymous(user) && (grants(conf, user) || grants(write, user)) {
            return true;
        }
        grants(read, user)
    }
}

/// True if the permission string names `@all` or `user`.
///
/// `@listowner` never matches here; the owner is admitted before any string
/// is consulted.
fn grants(perm: Option<&str>, user: &str) -> bool {
    let Some(perm) = perm else {
        return false;
    };
    perm.split(',')
        .map(str::trim)
        .filter(|token| *token != PERM_LIST_OWNER)
        .any(|token| token == PERM_ALL || token == user)
}

fn strongest(conf: Option<&str>, write: Option<&str>) -> &'static str {
    match (conf, write) {
        (Some(_), None) => Access::Configure.verb(),
        (_, Some(_)) => Access::Write.verb(),
        (None, None) => Access::Read.verb(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_trimmed() {
        assert!(grants(Some(" ann ,  bob "), "bob"));
        assert!(!grants(Some("ann,bob"), "bo"));
    }

    #[test]
    fn list_owner_token_grants_nobody() {
        assert!(!grants(Some("@listowner"), "@listowner"));
    }

    #[test]
    fn absent_string_grants_nothing() {
        assert!(!grants(None, "ann"));
    }

    #[test]
    fn all_token_inside_a_list_grants_everyone() {
        assert!(grants(Some("ann, @all"), "zed"));
    }
}

//! Role types for group membership.

use std::str::FromStr;

/// Role of a member inside a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberRole {
    Member,
    Admin,
}

/// Error type for parsing MemberRole from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMemberRoleError(pub String);

impl std::fmt::Display for ParseMemberRoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseMemberRoleError {}

impl FromStr for MemberRole {
    type Err = ParseMemberRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(MemberRole::Member),
            "admin" => Ok(MemberRole::Admin),
            _ => Err(ParseMemberRoleError(s.to_string())),
        }
    }
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, MemberRole::Admin)
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

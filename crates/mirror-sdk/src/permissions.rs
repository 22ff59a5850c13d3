//! Reflection Permissions
//!
//! Controls which members a reflective caller may touch. Every reflective
//! member operation takes the permission the caller holds; non-public members
//! need the matching `*_PRIVATE` flag. Permissions are checked per call and
//! never recorded on the member, so granting access for one call leaves the
//! member's accessibility unchanged for everyone else.
//!
//! ## Class Rules
//!
//! A [`PermissionPolicy`] resolves the permission for a target class from a
//! global default plus pattern rules:
//!
//! | Pattern         | Matches                                     |
//! |-----------------|---------------------------------------------|
//! | `com.acme.Vault` | exactly that class                         |
//! | `com.acme.*`    | classes directly in `com.acme`              |
//! | `com.acme.**`   | classes anywhere below `com.acme`           |
//! | `*`, `**`       | every class                                 |
//!
//! Exact rules win over patterns; among patterns the longest one wins.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::class::Visibility;
use crate::error::{MirrorError, MirrorResult};

/// Access a reflective caller holds over class members.
///
/// One bit per (access, visibility) pair. `*_PRIVATE` covers every
/// non-public visibility: protected, package-private and private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReflectionPermission(u8);

impl ReflectionPermission {
    /// Nothing may be touched
    pub const NONE: Self = Self(0);
    /// `FieldRef::get` on public fields
    pub const READ_PUBLIC: Self = Self(1 << 0);
    /// `FieldRef::get` on non-public fields
    pub const READ_PRIVATE: Self = Self(1 << 1);
    /// `FieldRef::set` on public fields
    pub const WRITE_PUBLIC: Self = Self(1 << 2);
    /// `FieldRef::set` on non-public fields
    pub const WRITE_PRIVATE: Self = Self(1 << 3);
    /// Public methods and constructors
    pub const INVOKE_PUBLIC: Self = Self(1 << 4);
    /// Non-public methods and constructors
    pub const INVOKE_PRIVATE: Self = Self(1 << 5);

    /// Every field read
    pub const READ_ALL: Self = Self::READ_PUBLIC.union(Self::READ_PRIVATE);
    /// Every field write
    pub const WRITE_ALL: Self = Self::WRITE_PUBLIC.union(Self::WRITE_PRIVATE);
    /// Every call
    pub const INVOKE_ALL: Self = Self::INVOKE_PUBLIC.union(Self::INVOKE_PRIVATE);
    /// What ordinary, non-reflective code could do
    pub const PUBLIC_ONLY: Self = Self::READ_PUBLIC
        .union(Self::WRITE_PUBLIC)
        .union(Self::INVOKE_PUBLIC);
    /// Visibility bypass for every member
    pub const FULL_ACCESS: Self = Self::READ_ALL.union(Self::WRITE_ALL).union(Self::INVOKE_ALL);

    /// Named flags and combinations, as accepted in config files
    const NAMED: [(&'static str, Self); 12] = [
        ("NONE", Self::NONE),
        ("READ_PUBLIC", Self::READ_PUBLIC),
        ("READ_PRIVATE", Self::READ_PRIVATE),
        ("WRITE_PUBLIC", Self::WRITE_PUBLIC),
        ("WRITE_PRIVATE", Self::WRITE_PRIVATE),
        ("INVOKE_PUBLIC", Self::INVOKE_PUBLIC),
        ("INVOKE_PRIVATE", Self::INVOKE_PRIVATE),
        ("READ_ALL", Self::READ_ALL),
        ("WRITE_ALL", Self::WRITE_ALL),
        ("INVOKE_ALL", Self::INVOKE_ALL),
        ("PUBLIC_ONLY", Self::PUBLIC_ONLY),
        ("FULL_ACCESS", Self::FULL_ACCESS),
    ];

    /// Wrap raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Every bit of `other` is held
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags held by either
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Flags held by both
    pub const fn intersection(&self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Drop the flags in `other`
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Parse one flag name (case-insensitive) or a `0x..`/decimal literal
    pub fn parse(s: &str) -> Option<Self> {
        let named = Self::NAMED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, permission)| permission);
        named.or_else(|| match s.strip_prefix("0x") {
            Some(hex) => u8::from_str_radix(hex, 16).ok().map(Self),
            None => s.parse().ok().map(Self),
        })
    }

    /// Parse combined flags from pipe-separated string (e.g., "READ_ALL|INVOKE_PUBLIC")
    pub fn parse_combined(s: &str) -> Option<Self> {
        let mut result = Self::NONE;
        for part in s.split('|') {
            let perm = Self::parse(part.trim())?;
            result = result.union(perm);
        }
        Some(result)
    }

    /// Flag required to perform `access` on a member with `visibility`
    pub fn required_for(access: MemberAccess, visibility: Visibility) -> Self {
        let private = !visibility.is_public();
        match (access, private) {
            (MemberAccess::Read, false) => Self::READ_PUBLIC,
            (MemberAccess::Read, true) => Self::READ_PRIVATE,
            (MemberAccess::Write, false) => Self::WRITE_PUBLIC,
            (MemberAccess::Write, true) => Self::WRITE_PRIVATE,
            (MemberAccess::Invoke, false) => Self::INVOKE_PUBLIC,
            (MemberAccess::Invoke, true) => Self::INVOKE_PRIVATE,
        }
    }

    /// Check that this permission covers `access` on a member, for a call
    pub fn check(
        &self,
        access: MemberAccess,
        visibility: Visibility,
        member: &str,
    ) -> MirrorResult<()> {
        let required = Self::required_for(access, visibility);
        if !self.contains(required) {
            return Err(MirrorError::IllegalAccess(format!(
                "cannot {} {} member `{}` (requires {})",
                access.verb(),
                visibility,
                member,
                required
            )));
        }
        Ok(())
    }
}

impl Default for ReflectionPermission {
    fn default() -> Self {
        Self::FULL_ACCESS
    }
}

impl fmt::Display for ReflectionPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::NAMED.iter().find(|(_, permission)| permission == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

impl TryFrom<String> for ReflectionPermission {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_combined(&value).ok_or_else(|| format!("invalid permission: {}", value))
    }
}

impl From<ReflectionPermission> for String {
    fn from(permission: ReflectionPermission) -> Self {
        permission.to_string()
    }
}

/// Kind of reflective member access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAccess {
    /// Field read
    Read,
    /// Field write
    Write,
    /// Method or constructor call
    Invoke,
}

impl MemberAccess {
    fn verb(&self) -> &'static str {
        match self {
            MemberAccess::Read => "read",
            MemberAccess::Write => "write",
            MemberAccess::Invoke => "invoke",
        }
    }
}

/// Class permission pattern (supports wildcards)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPermissionRule {
    /// Pattern (e.g., "com.acme.Vault", "com.acme.*", "**")
    pub pattern: String,
    /// Permissions for matching classes
    pub permissions: ReflectionPermission,
}

impl ClassPermissionRule {
    /// Check if this rule is a wildcard pattern
    pub fn is_pattern(&self) -> bool {
        self.pattern.contains('*')
    }

    /// Check if a class name matches this pattern
    pub fn matches(&self, class_name: &str) -> bool {
        if self.pattern == "**" || self.pattern == "*" {
            return true;
        }

        if let Some(prefix) = self.pattern.strip_suffix(".**") {
            class_name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.'))
        } else if let Some(prefix) = self.pattern.strip_suffix(".*") {
            class_name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('.'))
        } else {
            self.pattern == class_name
        }
    }
}

/// Global default plus per-class rules
#[derive(Debug, Clone, Default)]
pub struct PermissionPolicy {
    global_default: ReflectionPermission,
    rules: Vec<ClassPermissionRule>,
}

impl PermissionPolicy {
    /// Create a policy granting `global_default` to every class
    pub fn new(global_default: ReflectionPermission) -> Self {
        Self {
            global_default,
            rules: Vec::new(),
        }
    }

    /// Global default permissions
    pub fn global(&self) -> ReflectionPermission {
        self.global_default
    }

    /// Add a class rule
    pub fn add_rule(&mut self, pattern: impl Into<String>, permissions: ReflectionPermission) {
        self.rules.push(ClassPermissionRule {
            pattern: pattern.into(),
            permissions,
        });
    }

    /// Configured rules
    pub fn rules(&self) -> &[ClassPermissionRule] {
        &self.rules
    }

    /// Check if anything narrower than full access is configured
    pub fn has_any_restrictions(&self) -> bool {
        self.global_default != ReflectionPermission::FULL_ACCESS
            || self
                .rules
                .iter()
                .any(|r| r.permissions != ReflectionPermission::FULL_ACCESS)
    }

    /// Resolve the permission for a class
    pub fn resolve(&self, class_name: &str) -> ReflectionPermission {
        if let Some(rule) = self
            .rules
            .iter()
            .find(|r| !r.is_pattern() && r.pattern == class_name)
        {
            return rule.permissions;
        }

        self.rules
            .iter()
            .filter(|r| r.is_pattern() && r.matches(class_name))
            .max_by_key(|r| r.pattern.len())
            .map(|r| r.permissions)
            .unwrap_or(self.global_default)
    }
}

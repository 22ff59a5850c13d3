//! Error types shared by the SDK and the mirror engine

use crate::failure::Failure;

/// Result type for mirror operations
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Mirror error taxonomy
///
/// Everything except `Thrown` signals a caller or contract defect. `Thrown`
/// carries a failure raised by the hidden member itself (possibly converted by
/// a wrap rule).
#[derive(Debug, Clone, thiserror::Error)]
pub enum MirrorError {
    /// Malformed contract (missing marker, ambiguous member role, bad shape)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A type name did not resolve to a registered class
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// No hidden method, field or constructor matches
    #[error("No such member: {0}")]
    NoSuchMember(String),

    /// The held permission does not cover the member's visibility
    #[error("Illegal access: {0}")]
    IllegalAccess(String),

    /// Wrong arity, wrong value kind, or missing receiver
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// A mirror-side value or type could not be converted to its target form
    #[error("Unwrapping error: {0}")]
    Unwrapping(String),

    /// A target value could not be converted to its declared mirror type
    #[error("Wrapping error: {0}")]
    Wrapping(String),

    /// Building a mirror instance failed
    #[error("Cannot create mirror for `{contract}`: {source}")]
    MirrorCreation {
        /// Contract name
        contract: String,
        /// Underlying cause
        #[source]
        source: Box<MirrorError>,
    },

    /// Resolution, access or conversion failed while dispatching a call
    #[error("Invocation of `{member}` failed: {source}")]
    Invocation {
        /// Contract member signature
        member: String,
        /// Underlying cause
        #[source]
        source: Box<MirrorError>,
    },

    /// Resolution, access or conversion failed in a getter or setter
    #[error("Field access through `{member}` failed: {source}")]
    FieldAccess {
        /// Contract member signature
        member: String,
        /// Underlying cause
        #[source]
        source: Box<MirrorError>,
    },

    /// A wrap rule's destination kind could not be instantiated
    #[error("Cannot wrap failure into `{dest}`: {message}")]
    FailureWrap {
        /// Destination failure kind
        dest: String,
        /// Why construction failed
        message: String,
        /// The original failure, kept as a suppressed failure
        suppressed: Failure,
    },

    /// Failure raised by the invoked hidden member
    #[error("{0}")]
    Thrown(Failure),
}

impl MirrorError {
    /// Wrap as an invocation error for the given member
    pub fn invocation(member: impl Into<String>, source: MirrorError) -> Self {
        MirrorError::Invocation {
            member: member.into(),
            source: Box::new(source),
        }
    }

    /// Wrap as a field access error for the given getter or setter
    pub fn field_access(member: impl Into<String>, source: MirrorError) -> Self {
        MirrorError::FieldAccess {
            member: member.into(),
            source: Box::new(source),
        }
    }

    /// Wrap as a mirror creation error for the given contract
    pub fn creation(contract: impl Into<String>, source: MirrorError) -> Self {
        MirrorError::MirrorCreation {
            contract: contract.into(),
            source: Box::new(source),
        }
    }

    /// The failure carried by `Thrown`, if any
    pub fn thrown(&self) -> Option<&Failure> {
        match self {
            MirrorError::Thrown(failure) => Some(failure),
            _ => None,
        }
    }

    /// Innermost cause through `Invocation`, `FieldAccess` and
    /// `MirrorCreation` layers
    pub fn root(&self) -> &MirrorError {
        match self {
            MirrorError::Invocation { source, .. }
            | MirrorError::FieldAccess { source, .. }
            | MirrorError::MirrorCreation { source, .. } => source.root(),
            other => other,
        }
    }
}

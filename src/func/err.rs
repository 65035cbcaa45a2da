use thiserror::Error;

/// Every failure mode the core surfaces to callers.
///
/// Mutations that fail leave collection invariants intact; the core never
/// attempts internal recovery. See spec §7 for the propagation policy.
#[derive(Debug, Error)]
pub enum Error {
    /// A `Config` was constructed with a rejected parameter value.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of which parameter was rejected and why.
        message: String,
    },

    /// A distance function name was not recognized.
    #[error("unknown distance metric: '{name}'")]
    UnknownMetric {
        /// The unrecognized name.
        name: String,
    },

    /// A record's vector length did not match the collection's dimension.
    #[error("invalid vector dimension: expected {expected}, found {found}")]
    InvalidVectorDimension {
        /// The length that was given.
        found: usize,
        /// The collection's configured dimension.
        expected: usize,
    },

    /// The operand vector ID is not present in the collection.
    #[error("unknown vector id: {0:?}")]
    UnknownID(u32),

    /// A search was issued against an empty collection.
    #[error("cannot search an empty collection")]
    Empty,

    /// The metric kernel was called with unequal-length operands.
    #[error("dimension mismatch: {found} does not match {expected}")]
    DimensionMismatch {
        /// The length of the first operand.
        found: usize,
        /// The length of the second operand.
        expected: usize,
    },

    /// A persisted collection blob was written by an incompatible
    /// format version.
    #[error("incompatible collection blob version: expected {expected}, found {found}")]
    IncompatibleVersion {
        /// The version this build of the crate supports.
        expected: u16,
        /// The version recorded in the blob.
        found: u16,
    },

    /// A persisted collection blob failed to parse.
    #[error("corrupt collection blob: {message}")]
    CorruptBlob {
        /// Description of what failed to parse.
        message: String,
    },

    /// The collection has reached the maximum number of live records.
    #[error("collection is at capacity ({0} records)")]
    CollectionLimit(usize),

    /// A named collection was not found in the database.
    #[error("collection not found: '{0}'")]
    UnknownCollection(String),

    /// The underlying storage layer failed.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded key-value store failed.
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
}

impl Error {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig { message: message.into() }
    }

    pub(crate) fn unknown_metric(name: impl Into<String>) -> Self {
        Error::UnknownMetric { name: name.into() }
    }

    pub(crate) fn invalid_dimension(found: usize, expected: usize) -> Self {
        Error::InvalidVectorDimension { found, expected }
    }

    pub(crate) fn unknown_id(id: u32) -> Self {
        Error::UnknownID(id)
    }

    pub(crate) fn dimension_mismatch(found: usize, expected: usize) -> Self {
        Error::DimensionMismatch { found, expected }
    }

    pub(crate) fn incompatible_version(expected: u16, found: u16) -> Self {
        Error::IncompatibleVersion { expected, found }
    }

    pub(crate) fn corrupt_blob(message: impl Into<String>) -> Self {
        Error::CorruptBlob { message: message.into() }
    }

    pub(crate) fn collection_limit(limit: usize) -> Self {
        Error::CollectionLimit(limit)
    }

    pub(crate) fn unknown_collection(name: impl Into<String>) -> Self {
        Error::UnknownCollection(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimension_message_matches_scenario_wording() {
        let err = Error::invalid_dimension(100, 128);
        let message = err.to_string().to_lowercase();
        assert!(message.contains("invalid vector dimension"));
    }
}

use super::*;

/// Opaque payload attached to a `Record`.
///
/// The index never interprets the contents; the collection stores it
/// verbatim and hands it back unchanged on `get`/`list`/search results.
/// Callers that want structured payloads encode/decode their own data
/// to/from bytes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Metadata(pub Vec<u8>);

impl Metadata {
    /// Wraps an owned byte blob as payload.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Metadata {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<usize> for Metadata {
    /// Encodes an index/count as little-endian bytes. Used by
    /// `Record::random`/`Record::many_random` to stand in for a
    /// generation-index payload.
    fn from(value: usize) -> Self {
        Self((value as u64).to_le_bytes().to_vec())
    }
}

impl From<&str> for Metadata {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_an_index() {
        let data = Metadata::from(42usize);
        assert_eq!(u64::from_le_bytes(data.as_bytes().try_into().unwrap()), 42);
    }

    #[test]
    fn round_trips_text() {
        let data = Metadata::from("hello");
        assert_eq!(data.as_bytes(), b"hello");
    }
}

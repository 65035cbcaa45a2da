use super::*;

/// A directory-backed store of named collections.
///
/// Each collection is kept as an independent blob, written by
/// [`Collection::encode`] and restored by [`Collection::decode`].
/// Reads and writes go straight to disk via `sled`; the database holds
/// no in-memory cache of decoded collections, so callers that search a
/// collection repeatedly should keep their own handle to it rather than
/// calling [`Database::get_collection`] on every query.
pub struct Database {
    store: sled::Db,
}

impl Database {
    /// Opens (creating if necessary) a database directory at `path`.
    #[tracing::instrument(level = "info", skip(path))]
    pub fn new(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let store = sled::open(path)?;
        Ok(Self { store })
    }

    /// Writes `collection` under `name`, replacing any prior value.
    #[tracing::instrument(level = "debug", skip(self, collection))]
    pub fn save_collection(&self, name: &str, collection: &Collection) -> Result<(), Error> {
        let blob = collection.encode()?;
        let bytes = blob.len();
        self.store.insert(name.as_bytes(), blob)?;
        self.store.flush()?;
        tracing::debug!(name, bytes, "saved collection");
        Ok(())
    }

    /// Reads and decodes the collection stored under `name`.
    pub fn get_collection(&self, name: &str) -> Result<Collection, Error> {
        let blob = self
            .store
            .get(name.as_bytes())?
            .ok_or_else(|| Error::unknown_collection(name))?;
        Collection::decode(&blob)
    }

    /// Removes the collection stored under `name`.
    ///
    /// Fails with `UnknownCollection` if no such collection is present.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn delete_collection(&self, name: &str) -> Result<(), Error> {
        let removed = self.store.remove(name.as_bytes())?;
        if removed.is_none() {
            return Err(Error::unknown_collection(name));
        }
        self.store.flush()?;
        Ok(())
    }

    /// Number of collections stored in the database.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True if the database holds no collections.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::func::collection::{Config, Record};

    fn sample_collection() -> Collection {
        let config = Config::create_default();
        let mut collection = Collection::new(&config);
        for record in Record::many_random(8, 5) {
            collection.insert(&record).unwrap();
        }
        collection
    }

    #[test]
    fn save_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        let collection = sample_collection();

        db.save_collection("widgets", &collection).unwrap();
        let restored = db.get_collection("widgets").unwrap();
        assert_eq!(restored.len(), collection.len());
        assert_eq!(db.len(), 1);
        assert!(!db.is_empty());
    }

    #[test]
    fn get_unknown_collection_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        assert!(matches!(db.get_collection("missing"), Err(Error::UnknownCollection(_))));
    }

    #[test]
    fn delete_then_get_fails_and_len_drops() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        db.save_collection("widgets", &sample_collection()).unwrap();

        db.delete_collection("widgets").unwrap();
        assert!(db.is_empty());
        assert!(matches!(db.get_collection("widgets"), Err(Error::UnknownCollection(_))));
    }

    #[test]
    fn delete_unknown_collection_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        assert!(matches!(db.delete_collection("missing"), Err(Error::UnknownCollection(_))));
    }

    #[test]
    fn reopening_the_same_path_sees_prior_collections() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::new(dir.path()).unwrap();
            db.save_collection("widgets", &sample_collection()).unwrap();
        }

        let db = Database::new(dir.path()).unwrap();
        assert_eq!(db.len(), 1);
        assert!(db.get_collection("widgets").is_ok());
    }
}

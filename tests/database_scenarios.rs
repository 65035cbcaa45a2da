use vectorlite::prelude::*;

fn sample_collection(dimension: usize, len: usize) -> Collection {
    let config = Config::create_default();
    let mut collection = Collection::new(&config);
    collection.insert_many(&Record::many_random(dimension, len)).unwrap();
    collection
}

#[test]
fn save_get_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();
    assert!(db.is_empty());

    let collection = sample_collection(32, 10);
    db.save_collection("fruits", &collection).unwrap();
    assert_eq!(db.len(), 1);

    let restored = db.get_collection("fruits").unwrap();
    assert_eq!(restored.len(), collection.len());
    assert_eq!(restored.dimension(), collection.dimension());

    db.delete_collection("fruits").unwrap();
    assert!(db.is_empty());
    assert!(db.get_collection("fruits").is_err());
}

#[test]
fn unknown_collection_operations_fail() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    assert!(matches!(db.get_collection("ghost"), Err(Error::UnknownCollection(_))));
    assert!(matches!(db.delete_collection("ghost"), Err(Error::UnknownCollection(_))));
}

#[test]
fn multiple_collections_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    db.save_collection("a", &sample_collection(16, 5)).unwrap();
    db.save_collection("b", &sample_collection(32, 8)).unwrap();
    assert_eq!(db.len(), 2);

    let a = db.get_collection("a").unwrap();
    let b = db.get_collection("b").unwrap();
    assert_eq!(a.dimension(), 16);
    assert_eq!(b.dimension(), 32);
}

#[test]
fn search_results_survive_a_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path()).unwrap();

    let collection = sample_collection(24, 50);
    let query = Vector::random(24);
    let before = collection.search(&query, 5).unwrap();

    db.save_collection("widgets", &collection).unwrap();
    let restored = db.get_collection("widgets").unwrap();
    let after = restored.search(&query, 5).unwrap();

    assert_eq!(before, after);
}

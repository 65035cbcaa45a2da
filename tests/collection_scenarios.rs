use vectorlite::prelude::*;

#[test]
fn config_echo_matches_documented_defaults() {
    let explicit = Config::new(40, 15, 0.2885, "euclidean").unwrap();
    let default = Config::create_default();

    assert_eq!(explicit.ef_construction, default.ef_construction);
    assert_eq!(explicit.ef_search, default.ef_search);
    assert_eq!(explicit.ml, default.ml);
    assert_eq!(explicit.distance, default.distance);
}

#[test]
fn invalid_dimension_insert_leaves_collection_unchanged() {
    let config = Config::create_default();
    let mut collection = Collection::new(&config);

    for record in Record::many_random(128, 3) {
        collection.insert(&record).unwrap();
    }
    let len_before = collection.len();

    let err = collection.insert(&Record::random(64)).unwrap_err();
    assert!(err.to_string().to_lowercase().contains("invalid vector dimension"));
    assert_eq!(collection.len(), len_before);
}

#[test]
fn delete_restores_len_and_emptiness() {
    let config = Config::create_default();
    let mut collection = Collection::new(&config);
    let id = collection.insert(&Record::random(32)).unwrap();

    assert!(!collection.is_empty());
    collection.delete(&id).unwrap();
    assert!(collection.is_empty());
    assert!(!collection.contains(&id));
    assert_eq!(collection.len(), 0);
}

#[test]
fn ann_and_exact_search_agree_on_small_cosine_collection() {
    let config = Config::new(40, 15, 0.2885, "cosine").unwrap();
    let mut collection = Collection::new(&config);

    let ids: Vec<VectorID> = collection.insert_many(&Record::many_random(128, 5)).unwrap();
    assert_eq!(ids.len(), 5);

    let query = Vector::random(128);
    let approximate = collection.search(&query, 5).unwrap();
    let exact = collection.true_search(&query, 5).unwrap();

    let mut approximate_ids: Vec<VectorID> = approximate.iter().map(|r| r.id).collect();
    let mut exact_ids: Vec<VectorID> = exact.iter().map(|r| r.id).collect();
    approximate_ids.sort();
    exact_ids.sort();
    assert_eq!(approximate_ids, exact_ids);
}

#[test]
fn approximate_top_one_is_present_in_exact_top_ten() {
    let config = Config::create_default();
    let mut collection = Collection::new(&config);
    collection.insert_many(&Record::many_random(64, 200)).unwrap();

    let query = Vector::random(64);
    let approximate = collection.search(&query, 1).unwrap();
    let exact = collection.true_search(&query, 10).unwrap();

    let top = approximate[0].id;
    assert!(exact.iter().any(|r| r.id == top));
}

#[test]
fn update_preserves_id_and_replaces_vector() {
    let config = Config::create_default();
    let mut collection = Collection::new(&config);
    let id = collection.insert(&Record::random(16)).unwrap();

    let replacement = Record::random(16);
    collection.update(&id, &replacement).unwrap();

    let fetched = collection.get(&id).unwrap();
    assert_eq!(fetched.vector, replacement.vector);
    assert!(collection.contains(&id));
}

#[test]
fn relevancy_cutoff_drops_rather_than_clamps() {
    let config = Config::create_default();
    let mut collection = Collection::new(&config);
    collection.insert_many(&Record::many_random(16, 30)).unwrap();
    collection.relevancy = Some(4.5);

    let query = Vector::random(16);
    let results = collection.search(&query, 30).unwrap();
    assert!(results.iter().all(|r| r.distance <= 4.5));
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn search_on_empty_collection_is_empty_not_an_error() {
    let config = Config::create_default();
    let collection = Collection::new(&config);
    assert!(collection.search(&Vector::random(8), 5).unwrap().is_empty());
}

#[test]
fn dimension_setter_only_works_while_empty() {
    let config = Config::create_default();
    let mut collection = Collection::new(&config);
    assert!(collection.set_dimension(64).is_ok());

    collection.insert(&Record::random(64)).unwrap();
    assert!(collection.set_dimension(128).is_err());
}

#[test]
fn from_records_rejects_inconsistent_dimensions() {
    let config = Config::create_default();
    let mut records = Record::many_random(32, 4);
    records.push(Record::random(16));

    assert!(Collection::from_records(&config, &records).is_err());
}

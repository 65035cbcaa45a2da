use vectorlite::prelude::*;

fn main() -> Result<(), Error> {
    let config = Config::create_default();
    let mut collection = Collection::new(&config);

    let records = Record::many_random(128, 1_000);
    let ids = collection.insert_many(&records)?;
    println!("inserted {} records", ids.len());

    let query = Vector::random(128);
    let results = collection.search(&query, 5)?;
    for result in &results {
        println!("{:?} at distance {}", result.id, result.distance);
    }

    let db = Database::new("data/quickstart.db")?;
    db.save_collection("demo", &collection)?;
    println!("saved collection with {} records", db.get_collection("demo")?.len());

    Ok(())
}

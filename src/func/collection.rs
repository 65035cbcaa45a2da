use super::*;
use crate::ix::{GraphSnapshot, ProximityGraph};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};
use std::ops::Index;

const BLOB_MAGIC: [u8; 4] = *b"VLDB";
const BLOB_VERSION: u16 = 1;

/// Tunable parameters for a collection's proximity graph.
///
/// Negative or zero `ef_construction`, `ef_search`, or `ml` are rejected
/// at construction time with [`Error::InvalidConfig`]; an unrecognized
/// `distance` name is rejected with [`Error::UnknownMetric`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Beam width used while inserting a new record.
    pub ef_construction: usize,
    /// Beam width used while searching.
    pub ef_search: usize,
    /// Level-assignment normalization. The optimal value is `1/ln(M)`.
    pub ml: f32,
    /// Distance function used for both construction and search.
    pub distance: Distance,
}

impl Config {
    /// Builds a config from individual options, validating each.
    pub fn new(
        ef_construction: usize,
        ef_search: usize,
        ml: f32,
        distance: &str,
    ) -> Result<Self, Error> {
        if ef_construction == 0 {
            return Err(Error::invalid_config("ef_construction must be positive"));
        }
        if ef_search == 0 {
            return Err(Error::invalid_config("ef_search must be positive"));
        }
        if ml <= 0.0 {
            return Err(Error::invalid_config("ml must be positive"));
        }

        let distance = Distance::from(distance)?;
        Ok(Self { ef_construction, ef_search, ml, distance })
    }

    /// Replaces the distance function, validating the name.
    pub fn set_distance(&mut self, distance: &str) -> Result<(), Error> {
        self.distance = Distance::from(distance)?;
        Ok(())
    }

    /// Default configuration: `ef_construction=40`, `ef_search=15`,
    /// `ml=0.2885` (≈ `1/ln(16)`), `distance=euclidean`. Synonym for
    /// [`Default::default`].
    pub fn create_default() -> Self {
        Self::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ef_construction: 40,
            ef_search: 15,
            ml: 0.2885,
            distance: Distance::Euclidean,
        }
    }
}

/// A named set of vector records, indexed for approximate nearest-
/// neighbor search.
///
/// Owns the record map, the proximity graph, and the fixed dimension
/// once it has been established. See the crate-level invariants: every
/// stored vector has the collection's dimension, IDs are never reused,
/// and the dimension is immutable once set.
///
/// `Collection` does not derive `Serialize`/`Deserialize` directly —
/// its index carries scratch state (an RNG, a mutex-guarded search
/// pool) that has no business surviving a save/load round trip. Use
/// [`Collection::encode`]/[`Collection::decode`] instead, which persist
/// only the data needed to restore the invariants in full.
pub struct Collection {
    /// The collection's tunable parameters.
    pub config: Config,
    /// Optional distance cutoff applied to `search` results. `None`
    /// disables filtering.
    pub relevancy: Option<f32>,
    data: HashMap<VectorID, Metadata>,
    vectors: HashMap<VectorID, Vector>,
    graph: ProximityGraph,
    next_id: u32,
    count: usize,
    dimension: usize,
}

impl Index<&VectorID> for Collection {
    type Output = Vector;
    fn index(&self, index: &VectorID) -> &Self::Output {
        &self.vectors[index]
    }
}

impl Collection {
    /// Creates an empty collection with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            relevancy: None,
            data: HashMap::new(),
            vectors: HashMap::new(),
            graph: ProximityGraph::new(),
            next_id: 0,
            count: 0,
            dimension: 0,
        }
    }

    /// Creates an empty collection whose index RNG is seeded
    /// deterministically, so level assignment (and therefore search
    /// results) are reproducible across runs. Intended for tests.
    pub fn seeded(config: &Config, seed: u64) -> Self {
        Self {
            config: config.clone(),
            relevancy: None,
            data: HashMap::new(),
            vectors: HashMap::new(),
            graph: ProximityGraph::seeded(seed),
            next_id: 0,
            count: 0,
            dimension: 0,
        }
    }

    /// Builds a collection by inserting every record in order.
    ///
    /// Equivalent to `Collection::new` followed by `insert_many`, except
    /// a dimension mismatch among the records fails the whole call
    /// rather than leaving a partially built collection.
    pub fn from_records(config: &Config, records: &[Record]) -> Result<Self, Error> {
        let mut collection = Self::new(config);
        if records.is_empty() {
            return Ok(collection);
        }

        let dimension = records[0].vector.len();
        if records.iter().any(|r| r.vector.len() != dimension) {
            let offender = records.iter().find(|r| r.vector.len() != dimension).unwrap();
            return Err(Error::invalid_dimension(offender.vector.len(), dimension));
        }

        collection.insert_many(records)?;
        Ok(collection)
    }

    /// Inserts a record, returning its newly assigned ID.
    ///
    /// Sets the collection's dimension from the first record if it is
    /// not yet fixed. The record-map insertion is rolled back if the
    /// index insert fails, leaving the collection unchanged.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub fn insert(&mut self, record: &Record) -> Result<VectorID, Error> {
        if self.next_id == u32::MAX {
            return Err(Error::collection_limit(u32::MAX as usize));
        }

        if self.vectors.is_empty() && self.dimension == 0 {
            self.dimension = record.vector.len();
        } else {
            self.validate_dimension(&record.vector)?;
        }

        let id = VectorID(self.next_id);
        self.next_id += 1;

        self.vectors.insert(id, record.vector.clone());
        self.data.insert(id, record.data.clone());

        if let Err(err) = self.graph.insert(
            id,
            &self.vectors,
            self.config.ef_construction,
            self.config.ml,
            self.config.distance,
        ) {
            self.vectors.remove(&id);
            self.data.remove(&id);
            return Err(err);
        }

        self.count += 1;
        tracing::debug!(id = id.0, "inserted record");
        Ok(id)
    }

    /// Inserts every record in order, returning the assigned IDs.
    ///
    /// The first per-record failure aborts the batch; records already
    /// committed before the failure are not rolled back.
    pub fn insert_many(&mut self, records: &[Record]) -> Result<Vec<VectorID>, Error> {
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(self.insert(record)?);
        }
        Ok(ids)
    }

    /// Removes a record from the record map and the index.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: &VectorID) -> Result<(), Error> {
        if !self.contains(id) {
            return Err(Error::unknown_id(id.0));
        }

        self.graph.remove(*id, &self.vectors, self.config.ef_construction, self.config.distance)?;
        self.vectors.remove(id);
        self.data.remove(id);
        self.count -= 1;
        tracing::debug!(id = id.0, "deleted record");
        Ok(())
    }

    /// Returns a snapshot copy of every live record, keyed by ID.
    pub fn list(&self) -> HashMap<VectorID, Record> {
        self.vectors
            .par_iter()
            .map(|(id, vector)| {
                let data = self.data[id].clone();
                (*id, Record::new(vector, &data))
            })
            .collect()
    }

    /// Looks up a single record by ID.
    pub fn get(&self, id: &VectorID) -> Result<Record, Error> {
        if !self.contains(id) {
            return Err(Error::unknown_id(id.0));
        }

        Ok(Record::new(&self.vectors[id], &self.data[id]))
    }

    /// Replaces a record's vector and payload in place, preserving its
    /// ID. Equivalent to remove followed by insert-with-same-id.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub fn update(&mut self, id: &VectorID, record: &Record) -> Result<(), Error> {
        if !self.contains(id) {
            return Err(Error::unknown_id(id.0));
        }

        self.validate_dimension(&record.vector)?;

        self.graph.remove(*id, &self.vectors, self.config.ef_construction, self.config.distance)?;
        self.vectors.insert(*id, record.vector.clone());
        self.data.insert(*id, record.data.clone());
        self.graph.insert(
            *id,
            &self.vectors,
            self.config.ef_construction,
            self.config.ml,
            self.config.distance,
        )?;

        Ok(())
    }

    /// Approximate nearest-neighbor search, ranked ascending by
    /// distance and truncated to the `relevancy` cutoff (if set).
    #[tracing::instrument(level = "debug", skip(self, vector))]
    pub fn search(&self, vector: &Vector, n: usize) -> Result<Vec<SearchResult>, Error> {
        if self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        self.validate_dimension(vector)?;

        let candidates =
            self.graph.search(vector, self.config.ef_search, n, &self.vectors, self.config.distance)?;

        let results = candidates
            .into_iter()
            .map(|c| SearchResult {
                id: c.vector_id,
                distance: c.distance.0,
                data: self.data[&c.vector_id].clone(),
            })
            .collect();

        Ok(self.truncate_irrelevant(results))
    }

    /// Exhaustive search: computes distance to every live record.
    /// Used as an accuracy oracle independent of the index.
    pub fn true_search(&self, vector: &Vector, n: usize) -> Result<Vec<SearchResult>, Error> {
        if self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        self.validate_dimension(vector)?;

        let mut nearest: Vec<SearchResult> = self
            .vectors
            .iter()
            .map(|(id, vec)| {
                let distance = self.config.distance.calculate(vector, vec).unwrap_or(f32::INFINITY);
                SearchResult { id: *id, distance, data: self.data[id].clone() }
            })
            .collect();

        nearest.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap().then_with(|| a.id.cmp(&b.id))
        });

        let mut relevant = self.truncate_irrelevant(nearest);
        relevant.truncate(n);
        Ok(relevant)
    }

    /// The collection's fixed vector dimension, or 0 if still unset.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Sets the vector dimension. Only allowed while the collection is
    /// empty.
    pub fn set_dimension(&mut self, dimension: usize) -> Result<(), Error> {
        if !self.vectors.is_empty() {
            return Err(Error::invalid_config("dimension can only be set on an empty collection"));
        }

        self.dimension = dimension;
        Ok(())
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if the collection has no live records.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True if `id` names a live record.
    pub fn contains(&self, id: &VectorID) -> bool {
        self.vectors.contains_key(id)
    }

    fn validate_dimension(&self, vector: &Vector) -> Result<(), Error> {
        let found = vector.len();
        let expected = self.dimension;

        if found != expected {
            Err(Error::invalid_dimension(found, expected))
        } else {
            Ok(())
        }
    }

    /// Drops results whose distance exceeds `relevancy`, if set.
    fn truncate_irrelevant(&self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        match self.relevancy {
            Some(cutoff) if cutoff.is_finite() => {
                results.into_iter().filter(|r| r.distance <= cutoff).collect()
            }
            _ => results,
        }
    }

    /// Serializes the collection to a self-describing blob: a 4-byte
    /// magic, a little-endian version number, then a `bincode`-encoded
    /// body covering the config, records, and every graph layer.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let wire = CollectionWire {
            config: self.config.clone(),
            relevancy: self.relevancy,
            data: self.data.clone(),
            vectors: self.vectors.clone(),
            graph: self.graph.snapshot(),
            next_id: self.next_id,
            count: self.count,
            dimension: self.dimension,
        };

        let body = bincode::serialize(&wire).map_err(|e| Error::corrupt_blob(e.to_string()))?;
        let mut blob = Vec::with_capacity(body.len() + 6);
        blob.extend_from_slice(&BLOB_MAGIC);
        blob.write_u16::<LittleEndian>(BLOB_VERSION)?;
        blob.extend_from_slice(&body);
        Ok(blob)
    }

    /// Restores a collection from a blob produced by [`Collection::encode`].
    ///
    /// Fails with `CorruptBlob` if the magic bytes or body do not parse,
    /// or `IncompatibleVersion` if the blob was written by a version of
    /// this format this build does not support.
    pub fn decode(blob: &[u8]) -> Result<Self, Error> {
        let mut cursor = Cursor::new(blob);

        let mut magic = [0u8; 4];
        cursor
            .read_exact(&mut magic)
            .map_err(|_| Error::corrupt_blob("blob shorter than header"))?;
        if magic != BLOB_MAGIC {
            return Err(Error::corrupt_blob("bad magic bytes"));
        }

        let version = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| Error::corrupt_blob("blob shorter than header"))?;
        if version != BLOB_VERSION {
            return Err(Error::incompatible_version(BLOB_VERSION, version));
        }

        let body = &blob[cursor.position() as usize..];
        let wire: CollectionWire =
            bincode::deserialize(body).map_err(|e| Error::corrupt_blob(e.to_string()))?;

        Ok(Self {
            config: wire.config,
            relevancy: wire.relevancy,
            data: wire.data,
            vectors: wire.vectors,
            graph: ProximityGraph::from_snapshot(wire.graph),
            next_id: wire.next_id,
            count: wire.count,
            dimension: wire.dimension,
        })
    }
}

/// Plain-data shadow of `Collection` used only for (de)serialization.
#[derive(Serialize, Deserialize)]
struct CollectionWire {
    config: Config,
    relevancy: Option<f32>,
    data: HashMap<VectorID, Metadata>,
    vectors: HashMap<VectorID, Vector>,
    graph: GraphSnapshot,
    next_id: u32,
    count: usize,
    dimension: usize,
}

/// A vector paired with its opaque payload.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Record {
    /// The vector embedding.
    pub vector: Vector,
    /// Opaque data associated with the vector.
    pub data: Metadata,
}

impl Record {
    /// Creates a new record from a vector and its payload.
    pub fn new(vector: &Vector, data: &Metadata) -> Self {
        Self { vector: vector.clone(), data: data.clone() }
    }

    /// Generates a random record, with its payload set to `index`.
    pub fn random(dimension: usize) -> Self {
        Self::with_index(dimension, 0)
    }

    /// Generates a random record with its payload set to `index`.
    fn with_index(dimension: usize, index: usize) -> Self {
        let vector = Vector::random(dimension);
        let data = Metadata::from(index);
        Self::new(&vector, &data)
    }

    /// Generates `len` random records, with each payload set to its
    /// generation index.
    pub fn many_random(dimension: usize, len: usize) -> Vec<Self> {
        (0..len).map(|i| Self::with_index(dimension, i)).collect()
    }
}

/// One ranked result from a nearest-neighbor search.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// The matched vector's ID.
    pub id: VectorID,
    /// Distance from the query to the matched vector.
    pub distance: f32,
    /// The matched record's payload.
    pub data: Metadata,
}

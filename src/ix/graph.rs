use super::*;

/// The multi-layer proximity graph (spec §3/§4.D). Stores only
/// `VectorID`s — never vectors directly — so the graph has no ownership
/// cycles; every traversal resolves ids against the caller-supplied
/// vector map (the arena/index pattern, spec §9).
pub(crate) struct ProximityGraph {
    entry_point: VectorID,
    top_layer: LayerID,
    /// Index `i` holds the neighbor list of `VectorID(i)` at layer 0.
    base_layer: Vec<BaseNode>,
    /// `upper_layers[l - 1][i]` holds the neighbor list of `VectorID(i)`
    /// at layer `l`.
    upper_layers: Vec<Vec<UpperNode>>,
    /// `levels[i]` is the highest layer `VectorID(i)` was assigned to.
    levels: Vec<u8>,
    /// Whether `VectorID(i)` is currently live.
    alive: Vec<bool>,
    rng: StdRng,
    search_pool: SearchPool,
}

impl ProximityGraph {
    pub fn new() -> Self {
        Self {
            entry_point: INVALID,
            top_layer: LayerID(0),
            base_layer: Vec::new(),
            upper_layers: Vec::new(),
            levels: Vec::new(),
            alive: Vec::new(),
            rng: StdRng::from_entropy(),
            search_pool: SearchPool::new(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        let mut graph = Self::new();
        graph.rng = StdRng::seed_from_u64(seed);
        graph
    }

    pub fn is_empty(&self) -> bool {
        !self.entry_point.is_valid()
    }

    fn ensure_capacity(&mut self, id: VectorID) {
        let index = id.0 as usize;
        if self.base_layer.len() <= index {
            self.base_layer.resize(index + 1, BaseNode::default());
            self.levels.resize(index + 1, 0);
            self.alive.resize(index + 1, false);
        }
        for layer in self.upper_layers.iter_mut() {
            if layer.len() <= index {
                layer.resize(index + 1, UpperNode::default());
            }
        }
    }

    fn ensure_layers(&mut self, level: usize) {
        while self.upper_layers.len() < level {
            let size = self.base_layer.len();
            self.upper_layers.push(vec![UpperNode::default(); size]);
        }
    }

    fn random_level(&mut self, ml: f32) -> usize {
        let u: f32 = self.rng.gen_range(f32::EPSILON..=1.0);
        (-u.ln() * ml).floor() as usize
    }

    fn in_layer(&self, id: VectorID, layer: LayerID) -> bool {
        let index = id.0 as usize;
        self.alive.get(index).copied().unwrap_or(false)
            && self.levels.get(index).copied().unwrap_or(0) as usize >= layer.0
    }

    fn neighbors(&self, id: VectorID, layer: LayerID) -> Vec<VectorID> {
        if layer.is_zero() {
            match self.base_layer.get(id.0 as usize) {
                Some(node) => node.neighbors().collect(),
                None => Vec::new(),
            }
        } else {
            match self.upper_layers.get(layer.0 - 1).and_then(|l| l.get(id.0 as usize)) {
                Some(node) => node.neighbors().collect(),
                None => Vec::new(),
            }
        }
    }

    fn set_neighbors(&mut self, id: VectorID, layer: LayerID, ids: &[VectorID]) {
        if layer.is_zero() {
            self.base_layer[id.0 as usize].replace_with(ids);
        } else {
            self.upper_layers[layer.0 - 1][id.0 as usize].replace_with(ids);
        }
    }

    fn remove_neighbor(&mut self, id: VectorID, layer: LayerID, neighbor: VectorID) {
        if layer.is_zero() {
            if let Some(node) = self.base_layer.get_mut(id.0 as usize) {
                node.remove(neighbor);
            }
        } else if let Some(node) =
            self.upper_layers.get_mut(layer.0 - 1).and_then(|l| l.get_mut(id.0 as usize))
        {
            node.remove(neighbor);
        }
    }

    fn layer_nodes(&self, layer: LayerID) -> &dyn LayerNodes {
        if layer.is_zero() {
            self.base_layer.as_slice()
        } else {
            self.upper_layers[layer.0 - 1].as_slice()
        }
    }

    /// Single-beam hill climbing: move to the neighbor strictly closer to
    /// `query` than the current node, stop when no neighbor improves.
    fn greedy_closest(
        &self,
        start: VectorID,
        query: &Vector,
        vectors: &HashMap<VectorID, Vector>,
        metric: Distance,
        layer: LayerID,
    ) -> Result<VectorID, Error> {
        let mut current = start;
        let mut current_distance = metric.calculate(query, &vectors[&current])?;

        loop {
            let mut improved = false;
            for neighbor in self.neighbors(current, layer) {
                let Some(vector) = vectors.get(&neighbor) else { continue };
                let distance = metric.calculate(query, vector)?;
                if distance < current_distance {
                    current = neighbor;
                    current_distance = distance;
                    improved = true;
                }
            }
            if !improved {
                return Ok(current);
            }
        }
    }

    fn cap_for(layer: LayerID) -> usize {
        if layer.is_zero() {
            M_MAX0
        } else {
            M
        }
    }

    /// Adds `new_neighbor` to `id`'s neighbor list at `layer`, growing it
    /// directly if there is room, or re-running heuristic selection over
    /// the node's full edge set (and replacing it) when the cap would be
    /// exceeded (spec §4.D insertion step 6).
    fn add_neighbor(
        &mut self,
        id: VectorID,
        layer: LayerID,
        new_neighbor: VectorID,
        vectors: &HashMap<VectorID, Vector>,
        metric: Distance,
    ) -> Result<(), Error> {
        if id == new_neighbor {
            return Ok(());
        }

        let cap = Self::cap_for(layer);
        let mut current = self.neighbors(id, layer);
        if current.contains(&new_neighbor) {
            return Ok(());
        }

        current.push(new_neighbor);
        if current.len() <= cap {
            self.set_neighbors(id, layer, &current);
            return Ok(());
        }

        let mut candidates = Vec::with_capacity(current.len());
        for neighbor in &current {
            let distance = metric.calculate(&vectors[&id], &vectors[neighbor])?;
            candidates.push(Candidate { distance: OrderedFloat(distance), vector_id: *neighbor });
        }

        let trimmed = heuristic_select(&candidates, cap, id, vectors, metric)?;
        let ids: Vec<VectorID> = trimmed.iter().map(|c| c.vector_id).collect();
        self.set_neighbors(id, layer, &ids);
        Ok(())
    }

    /// Inserts `id` (already present in `vectors`) into the graph.
    /// Implements spec §4.D insertion steps 1–7.
    #[tracing::instrument(level = "trace", skip(self, vectors))]
    pub fn insert(
        &mut self,
        id: VectorID,
        vectors: &HashMap<VectorID, Vector>,
        ef_construction: usize,
        ml: f32,
        metric: Distance,
    ) -> Result<(), Error> {
        self.ensure_capacity(id);
        self.alive[id.0 as usize] = true;

        let level = self.random_level(ml);
        self.levels[id.0 as usize] = level.min(u8::MAX as usize) as u8;
        let level = self.levels[id.0 as usize] as usize;
        tracing::trace!(id = id.0, level, "assigned level");

        if !self.entry_point.is_valid() {
            // Graph had no live nodes yet: this node becomes the sole
            // entry point, with empty neighbor lists on layers 0..=level.
            self.ensure_layers(level);
            self.entry_point = id;
            self.top_layer = LayerID(level);
            tracing::trace!(id = id.0, "first node becomes entry point");
            return Ok(());
        }

        let query = &vectors[&id];
        let mut ep = self.entry_point;
        let top = self.top_layer;

        for layer in top.descend() {
            if layer.0 <= level {
                break;
            }
            ep = self.greedy_closest(ep, query, vectors, metric, layer)?;
        }
        tracing::trace!(id = id.0, entry_point = ep.0, "descended to insertion level");

        if level > top.0 {
            self.ensure_layers(level);
        }

        let start = std::cmp::min(level, top.0);
        for layer in LayerID(start).descend() {
            let mut search = self.search_pool.acquire();
            search.reset();
            search.resize_capacity(self.base_layer.len());
            search.ef = ef_construction;
            search.push(ep, query, vectors, metric)?;
            search.expand(query, vectors, metric, self.layer_nodes(layer))?;

            let candidates = search.results();
            self.search_pool.release(search);
            tracing::trace!(
                id = id.0,
                layer = layer.0,
                candidates = candidates.len(),
                "beam search expanded"
            );

            let cap = Self::cap_for(layer);
            let selected = heuristic_select(&candidates, cap, id, vectors, metric)?;
            let selected_ids: Vec<VectorID> = selected.iter().map(|c| c.vector_id).collect();
            self.set_neighbors(id, layer, &selected_ids);

            for neighbor in &selected_ids {
                self.add_neighbor(*neighbor, layer, id, vectors, metric)?;
            }

            if let Some(closest) = candidates.first() {
                ep = closest.vector_id;
            }
        }

        if level > top.0 {
            self.entry_point = id;
            self.top_layer = LayerID(level);
            tracing::trace!(id = id.0, level, "promoted to new entry point");
        }

        Ok(())
    }

    /// Removes `id` from every layer it belongs to, repairing any
    /// neighbor left with too few links, then reconciles the entry point
    /// and top layer (spec §4.D delete procedure).
    #[tracing::instrument(level = "trace", skip(self, vectors))]
    pub fn remove(
        &mut self,
        id: VectorID,
        vectors: &HashMap<VectorID, Vector>,
        ef_construction: usize,
        metric: Distance,
    ) -> Result<(), Error> {
        let level = self.levels.get(id.0 as usize).copied().unwrap_or(0) as usize;
        self.alive[id.0 as usize] = false;
        tracing::trace!(id = id.0, level, "removing node from graph");

        for layer in LayerID(level).descend() {
            let cap = Self::cap_for(layer);
            let former_neighbors = self.neighbors(id, layer);

            for &neighbor in &former_neighbors {
                self.remove_neighbor(neighbor, layer, id);
            }
            self.set_neighbors(id, layer, &[]);

            let repair_threshold = M / 2;
            for &neighbor in &former_neighbors {
                if !self.in_layer(neighbor, layer) {
                    continue;
                }
                if self.neighbors(neighbor, layer).len() < repair_threshold {
                    tracing::trace!(
                        neighbor = neighbor.0,
                        layer = layer.0,
                        "repairing under-connected neighbor"
                    );
                    self.repair(neighbor, layer, cap, vectors, ef_construction, metric)?;
                }
            }
        }

        self.reconcile_top();
        tracing::trace!(
            id = id.0,
            entry_point = self.entry_point.0,
            top_layer = self.top_layer.0,
            "reconciled entry point after removal"
        );
        Ok(())
    }

    /// Local re-linking after a delete leaves `n` under-connected at
    /// `layer`: beam search from `n` and pick new neighbors heuristically.
    fn repair(
        &mut self,
        n: VectorID,
        layer: LayerID,
        cap: usize,
        vectors: &HashMap<VectorID, Vector>,
        ef_construction: usize,
        metric: Distance,
    ) -> Result<(), Error> {
        let query = &vectors[&n];
        let mut search = self.search_pool.acquire();
        search.reset();
        search.resize_capacity(self.base_layer.len());
        search.ef = ef_construction;
        search.push(n, query, vectors, metric)?;
        search.expand(query, vectors, metric, self.layer_nodes(layer))?;
        let candidates: Vec<Candidate> =
            search.results().into_iter().filter(|c| c.vector_id != n).collect();
        self.search_pool.release(search);

        let selected = heuristic_select(&candidates, cap, n, vectors, metric)?;
        let ids: Vec<VectorID> = selected.iter().map(|c| c.vector_id).collect();
        self.set_neighbors(n, layer, &ids);
        Ok(())
    }

    /// Recomputes the top layer and entry point from scratch after a
    /// delete: the highest layer with a surviving member becomes the new
    /// top layer, and its lowest-ID member becomes the entry point
    /// (deterministic promotion, spec §4.D).
    fn reconcile_top(&mut self) {
        let mut layer = self.top_layer.0;
        loop {
            let lowest = (0..self.alive.len())
                .map(VectorID::from)
                .filter(|&id| self.in_layer(id, LayerID(layer)))
                .min();

            if let Some(lowest) = lowest {
                self.top_layer = LayerID(layer);
                if !self.in_layer(self.entry_point, LayerID(layer)) {
                    self.entry_point = lowest;
                }
                return;
            }

            if layer == 0 {
                self.entry_point = INVALID;
                self.top_layer = LayerID(0);
                return;
            }
            layer -= 1;
        }
    }

    /// Approximate nearest-neighbor search (spec §4.D query procedure):
    /// greedy descent through the upper layers, then one bounded beam
    /// search at layer 0 with width `max(ef_search, k)`.
    #[tracing::instrument(level = "trace", skip(self, query, vectors))]
    pub fn search(
        &self,
        query: &Vector,
        ef_search: usize,
        k: usize,
        vectors: &HashMap<VectorID, Vector>,
        metric: Distance,
    ) -> Result<Vec<Candidate>, Error> {
        if self.is_empty() {
            return Err(Error::Empty);
        }

        let mut ep = self.entry_point;
        for layer in self.top_layer.descend() {
            if layer.is_zero() {
                break;
            }
            ep = self.greedy_closest(ep, query, vectors, metric, layer)?;
        }
        tracing::trace!(entry_point = ep.0, "descended to layer 0 for beam search");

        let mut search = self.search_pool.acquire();
        search.reset();
        search.resize_capacity(self.base_layer.len());
        search.ef = std::cmp::max(ef_search, k);
        search.push(ep, query, vectors, metric)?;
        search.expand(query, vectors, metric, self.layer_nodes(LayerID(0)))?;

        let mut results = search.results();
        self.search_pool.release(search);
        tracing::trace!(found = results.len(), k, "beam search expanded at layer 0");

        results.truncate(k);
        Ok(results)
    }
}

impl Default for ProximityGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// The serializable portion of a `ProximityGraph`: every layer's
/// adjacency plus bookkeeping needed to restore search determinism.
/// The RNG and search scratch pool are intentionally excluded — they
/// carry no data that needs to survive a save/load round trip.
#[derive(Clone, Serialize, Deserialize)]
pub(crate) struct GraphSnapshot {
    pub entry_point: VectorID,
    pub top_layer: usize,
    pub base_layer: Vec<BaseNode>,
    pub upper_layers: Vec<Vec<UpperNode>>,
    pub levels: Vec<u8>,
    pub alive: Vec<bool>,
}

impl ProximityGraph {
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            entry_point: self.entry_point,
            top_layer: self.top_layer.0,
            base_layer: self.base_layer.clone(),
            upper_layers: self.upper_layers.clone(),
            levels: self.levels.clone(),
            alive: self.alive.clone(),
        }
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        Self {
            entry_point: snapshot.entry_point,
            top_layer: LayerID(snapshot.top_layer),
            base_layer: snapshot.base_layer,
            upper_layers: snapshot.upper_layers,
            levels: snapshot.levels,
            alive: snapshot.alive,
            rng: StdRng::from_entropy(),
            search_pool: SearchPool::new(),
        }
    }
}

use super::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// One scored candidate during a beam search: a vector id at a distance
/// from the query. Ordered by distance first, then by `VectorID`
/// ascending so ties are deterministic across runs and serialization
/// round-trips (spec tie-breaking rule).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub distance: OrderedFloat<f32>,
    pub vector_id: VectorID,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.vector_id.cmp(&other.vector_id))
    }
}

/// Reusable scratch state for one beam search. Holds a min-heap of
/// candidates still to expand, a bounded max-heap of the best `ef`
/// results seen so far, and a per-query visited set.
pub(crate) struct Search {
    pub ef: usize,
    visited: Vec<bool>,
    candidates: BinaryHeap<Reverse<Candidate>>,
    best: BinaryHeap<Candidate>,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            ef: 1,
            visited: Vec::new(),
            candidates: BinaryHeap::new(),
            best: BinaryHeap::new(),
        }
    }
}

impl Search {
    /// Clears all scratch state, keeping allocated capacity for reuse.
    pub fn reset(&mut self) {
        self.visited.clear();
        self.candidates.clear();
        self.best.clear();
    }

    /// Grows the visited bitset to cover ids up to `capacity - 1`.
    pub fn resize_capacity(&mut self, capacity: usize) {
        if self.visited.len() < capacity {
            self.visited.resize(capacity, false);
        }
    }

    fn is_visited(&self, id: VectorID) -> bool {
        self.visited.get(id.0 as usize).copied().unwrap_or(false)
    }

    fn mark_visited(&mut self, id: VectorID) {
        if self.visited.len() <= id.0 as usize {
            self.visited.resize(id.0 as usize + 1, false);
        }
        self.visited[id.0 as usize] = true;
    }

    /// Seeds the search with a single starting candidate.
    pub fn push(
        &mut self,
        id: VectorID,
        query: &Vector,
        vectors: &HashMap<VectorID, Vector>,
        metric: Distance,
    ) -> Result<(), Error> {
        if self.is_visited(id) {
            return Ok(());
        }

        self.mark_visited(id);
        let distance = metric.calculate(query, &vectors[&id])?;
        let candidate = Candidate { distance: OrderedFloat(distance), vector_id: id };
        self.candidates.push(Reverse(candidate));
        self.best.push(candidate);
        Ok(())
    }

    /// Runs the bounded beam search described in spec §4.D: repeatedly
    /// pop the closest unexpanded candidate, stop once it can no longer
    /// improve a full best-set, otherwise expand its neighbors in
    /// `nodes` and fold them into both heaps.
    pub fn expand(
        &mut self,
        query: &Vector,
        vectors: &HashMap<VectorID, Vector>,
        metric: Distance,
        nodes: &dyn LayerNodes,
    ) -> Result<(), Error> {
        while let Some(Reverse(candidate)) = self.candidates.pop() {
            if self.best.len() >= self.ef {
                if let Some(worst) = self.best.peek() {
                    if candidate.distance > worst.distance {
                        break;
                    }
                }
            }

            for neighbor in nodes.neighbors(candidate.vector_id) {
                if self.is_visited(neighbor) {
                    continue;
                }
                self.mark_visited(neighbor);

                let distance = metric.calculate(query, &vectors[&neighbor])?;
                let next = Candidate { distance: OrderedFloat(distance), vector_id: neighbor };

                if self.best.len() < self.ef {
                    self.candidates.push(Reverse(next));
                    self.best.push(next);
                } else if let Some(worst) = self.best.peek() {
                    if next.distance < worst.distance {
                        self.candidates.push(Reverse(next));
                        self.best.push(next);
                        while self.best.len() > self.ef {
                            self.best.pop();
                        }
                    }
                }
            }
        }

        tracing::trace!(visited = self.visited.iter().filter(|&&v| v).count(), kept = self.best.len(), "expand finished");
        Ok(())
    }

    /// Returns the best-set, sorted ascending by distance (ties broken
    /// by `VectorID` ascending).
    pub fn results(&self) -> Vec<Candidate> {
        let mut results: Vec<Candidate> = self.best.iter().copied().collect();
        results.sort();
        results
    }
}

/// Abstracts over a base-layer (`[BaseNode]`) or upper-layer (`[UpperNode]`)
/// slice so beam search code does not need to know which it is expanding.
pub(crate) trait LayerNodes {
    fn neighbors(&self, id: VectorID) -> Vec<VectorID>;
}

impl LayerNodes for [BaseNode] {
    fn neighbors(&self, id: VectorID) -> Vec<VectorID> {
        match self.get(id.0 as usize) {
            Some(node) => node.neighbors().collect(),
            None => Vec::new(),
        }
    }
}

impl LayerNodes for [UpperNode] {
    fn neighbors(&self, id: VectorID) -> Vec<VectorID> {
        match self.get(id.0 as usize) {
            Some(node) => node.neighbors().collect(),
            None => Vec::new(),
        }
    }
}

/// Selects a diversity-preserving subset of `candidates`, capped at `m`,
/// relative to `origin`: the closest remaining candidate is kept unless
/// some already-kept candidate is strictly closer to it than it is to
/// `origin` (i.e. dominates it). Prevents hub collapse (spec §4.D).
pub(crate) fn heuristic_select(
    candidates: &[Candidate],
    m: usize,
    origin: VectorID,
    vectors: &HashMap<VectorID, Vector>,
    metric: Distance,
) -> Result<Vec<Candidate>, Error> {
    let mut sorted = candidates.to_vec();
    sorted.sort();

    let mut selected: Vec<Candidate> = Vec::with_capacity(m.min(sorted.len()));
    for candidate in sorted {
        if selected.len() >= m {
            break;
        }

        let mut dominated = false;
        for kept in &selected {
            let d = metric.calculate(&vectors[&candidate.vector_id], &vectors[&kept.vector_id])?;
            if d < candidate.distance.0 {
                dominated = true;
                break;
            }
        }

        if !dominated && candidate.vector_id != origin {
            selected.push(candidate);
        }
    }

    Ok(selected)
}

/// A small pool of reusable `Search` scratch buffers shared across
/// concurrent read-only queries, avoiding a fresh heap allocation for the
/// visited set on every call.
pub(crate) struct SearchPool {
    pool: Mutex<Vec<Search>>,
}

impl SearchPool {
    pub fn new() -> Self {
        Self { pool: Mutex::new(Vec::new()) }
    }

    pub fn acquire(&self) -> Search {
        self.pool.lock().pop().unwrap_or_default()
    }

    pub fn release(&self, mut search: Search) {
        search.reset();
        self.pool.lock().push(search);
    }
}

impl Default for SearchPool {
    fn default() -> Self {
        Self::new()
    }
}

mod graph;
mod node;
mod search;

pub(crate) use graph::{GraphSnapshot, ProximityGraph};
pub(crate) use node::{BaseNode, UpperNode, LayerID, M, M_MAX0};
pub(crate) use search::{heuristic_select, Candidate, LayerNodes, Search, SearchPool};

use crate::func::distance::Distance;
use crate::func::err::Error;
use crate::func::vector::{Vector, VectorID, INVALID};
use ordered_float::OrderedFloat;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use std::collections::HashMap;

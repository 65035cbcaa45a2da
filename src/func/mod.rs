pub mod collection;
pub mod distance;
pub mod err;
pub mod metadata;
pub mod vector;

use distance::Distance;
use err::Error;
use metadata::Metadata;
use rand::random;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vector::{Vector, VectorID};

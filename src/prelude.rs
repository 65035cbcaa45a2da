//! Common imports for working with a collection end to end.

pub use crate::db::database::Database;
pub use crate::func::collection::{Collection, Config, Record, SearchResult};
pub use crate::func::distance::Distance;
pub use crate::func::err::Error;
pub use crate::func::metadata::Metadata;
pub use crate::func::vector::{Vector, VectorID};

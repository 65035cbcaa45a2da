pub mod database;

use crate::func::collection::Collection;
use crate::func::err::Error;

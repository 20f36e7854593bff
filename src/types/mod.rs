mod object;
mod query;

pub use object::{ObjectRecord, StoredObject, Uid};
pub use query::{OrderDirection, QueryRequest, QueryResult};

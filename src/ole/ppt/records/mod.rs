//! Record decode/encode framework.

mod record;
pub mod types;

pub use record::{PptRecord, RecordBody, find_child_records};
pub use types::{RecordKind, RecordTypeInfo, kind_of, lookup, name_of};

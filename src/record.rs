//! Record store: schemas, slotted record pages and table scans.
//!
//! This is the smallest record manager the query engine can run on. Tables
//! and temporary tables are both plain files of fixed-length slots, read and
//! written through [`TableScan`].

pub mod layout;
pub mod page;
pub mod schema;
pub mod table_scan;

pub use layout::Layout;
pub use page::RecordPage;
pub use schema::{FieldInfo, FieldType, Schema};
pub(crate) use table_scan::check_value;
pub use table_scan::{Rid, TableScan};

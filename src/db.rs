//! Database handle.
//!
//! A [`Database`] ties together the components a statement runs against:
//!
//! ```text
//! +------------------------------------------------------------+
//! |                         Database                           |
//! |                                                            |
//! |  +------------------+  +------------------+  +----------+  |
//! |  | Arc<Memory-      |  | Arc<Transaction- |  | Arc<     |  |
//! |  |     Storage>     |  |     Manager>     |  |  Catalog>|  |
//! |  | (block files)    |  | (ids, temp names)|  | (tables, |  |
//! |  +--------+---------+  +------------------+  |  views,  |  |
//! |           ^                                  |  indexes)|  |
//! |           |                                  +----+-----+  |
//! |           |              +-----------+            |        |
//! |           +--------------+  Planner  +<-----------+        |
//! |                          +-----------+                     |
//! +------------------------------------------------------------+
//! ```

mod database;

pub use database::Database;

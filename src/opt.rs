//! Cost-based query optimization.
//!
//! [`HeuristicQueryPlanner`] orders a query's tables greedily and asks one
//! [`TablePlanner`] per table how to read it and how to join it. Join
//! strategies are compared by estimated block accesses in
//! [`choose_join`], with ties going to the strategy listed first in
//! [`JoinStrategy`].

mod heuristic;
mod join_choice;
mod table_planner;

pub use heuristic::HeuristicQueryPlanner;
pub use join_choice::{choose_join, Cost, JoinStrategy};
pub use table_planner::TablePlanner;

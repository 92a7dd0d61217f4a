//! Node expansion: view state, the toggle protocol and rendered rows

mod expansion;
mod explorer;
mod rows;

pub use expansion::{affordance, ExpansionState, ExpansionTable, NoAffordance, NodeState};
pub use explorer::{Explorer, NodeController, ToggleOutcome};
pub use rows::{visible_rows, VisibleRow};

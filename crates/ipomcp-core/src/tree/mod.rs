mod arena;
mod edges;
pub mod error;
mod history;
pub mod ids;
mod node;
mod observations;
pub mod search_tree;
pub mod snapshot;
mod stats;

pub use edges::ActionEdge;
pub use history::{FacNode, HistoryElement};
pub use node::TreeNode;
pub use observations::{ObservationLink, ObservationSet};

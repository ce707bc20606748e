//! The namespace projection engine.
//!
//! Real paths are projected into virtual paths by a [`ProjectionStrategy`],
//! the directories they imply are synthesized into a [`NamespaceIndex`], and
//! the [`ReloadCoordinator`] swaps whole indexes in while lookups continue.

pub mod collision;
pub mod coordinator;
pub mod index;
pub mod path;
pub mod resolver;
pub mod strategy;
pub mod synth;

pub use collision::CollisionResolver;
pub use coordinator::ReloadCoordinator;
pub use index::{Entry, NamespaceIndex};
pub use resolver::ResolvedTarget;
pub use strategy::ProjectionStrategy;
pub use synth::{DirectoryNode, NamespaceConflict};

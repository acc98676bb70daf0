//! Live collection mirrors and editing state.
//!
//! Each store owns the local mirror of one remote collection exclusively:
//! the mirror is replaced wholesale on every live emission and is never
//! mutated directly by UI code. Edits happen on draft copies held by the
//! editor until an explicit save.

mod categories;
mod documents;
mod editor;
mod memory;
mod mirror;
mod notes;

pub use categories::CategoryStore;
pub use documents::{Collection, Document, Query, SnapshotEvent, Snapshots};
pub use editor::{EditorState, NoteEditor};
pub use memory::MemoryCollection;
pub use mirror::{Emission, Freshness};
pub use notes::NoteStore;

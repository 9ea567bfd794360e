/// Line building and anchoring of realized children.
pub mod layout;
/// Content parts and the children they realize into.
pub mod part;
/// Left-to-right row packing.
pub mod positioner;
/// The paragraph container tying parts, runs and layout together.
pub mod text_flow;

pub use layout::{EntityPlacement, FlowConfig, FlowEntity, FlowLine, FlowOutput, TextAnchor};
pub use part::{ChildKind, FlowChild, Ownership, SharedRun, TextPart};
pub use positioner::{PackItem, PackedRow, Packing, RowPacker};
pub use text_flow::{PartId, TextFlow};

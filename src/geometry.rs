//! Typed coordinate spaces used by runs and flows.

/// Local space of a single glyph run. Origin is the run's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunSpace;

/// Space of the container that positions runs (the flow, or any parent).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlowSpace;

pub type RunPoint = euclid::Point2D<f32, RunSpace>;
pub type RunVector = euclid::Vector2D<f32, RunSpace>;
pub type RunSize = euclid::Size2D<f32, RunSpace>;
pub type RunRect = euclid::Rect<f32, RunSpace>;
/// `top`, `right`, `bottom`, `left` insets around a run's content.
pub type Padding = euclid::SideOffsets2D<f32, RunSpace>;

pub type FlowPoint = euclid::Point2D<f32, FlowSpace>;
pub type FlowVector = euclid::Vector2D<f32, FlowSpace>;
pub type FlowSize = euclid::Size2D<f32, FlowSpace>;
pub type FlowRect = euclid::Rect<f32, FlowSpace>;

/// Maps a run's local space into its parent's space.
pub type RunToFlow = euclid::Transform2D<f32, RunSpace, FlowSpace>;

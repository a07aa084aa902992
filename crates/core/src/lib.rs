pub mod coord;
pub mod error;
pub mod range;
pub mod selection;

pub use coord::Coord;
pub use error::GridError;
pub use range::{RangeBounds, RangeSpec, ResolvedRange, SheetExtents};
pub use selection::SheetSelector;

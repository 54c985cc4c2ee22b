pub mod fixture;
pub mod snapshot;

pub use fixture::{FixturePage, PageAction};
pub use snapshot::{ElementData, NodeId, NodeKind, NodeRef, PageSnapshot, RawCapture};

pub mod body;
pub mod count;

pub use body::{format_body, FormattedBody, Segment, SegmentKind};
pub use count::{format_count, format_number};

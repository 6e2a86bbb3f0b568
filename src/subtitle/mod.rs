/*!
 * Subtitle text handling.
 *
 * - `timestamp`: millisecond timestamps and their text form
 * - `codec`: parsing, serializing and validating subtitle documents
 * - `store`: the editable segment list used during review
 */

pub mod codec;
pub mod store;
pub mod timestamp;

pub use codec::{CaptionSegment, DocumentInfo, OverlapWarning, SerializeOptions, ValidatedDocument};
pub use store::{SegmentIssue, SegmentStore, TimeField, TimeInput};
pub use timestamp::{Timestamp, format_timestamp, parse_timestamp};

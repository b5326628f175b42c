pub mod io;
pub mod logging;
pub mod messages;
pub mod time;

pub use messages::{MessageBoard, MessageId, MessageKind, TimedMessage};

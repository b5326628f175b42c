pub mod upload;

pub use upload::{upload_face, FaceCapture, FaceError};

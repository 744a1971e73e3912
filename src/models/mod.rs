pub mod demographics;
pub mod manifest;
pub mod question;
pub mod submission;

pub use demographics::Demographics;
pub use manifest::{ImageRef, Manifest, ManifestResponse, Pair, PairPayload};
pub use question::{questions_for, Answer, Choice, Question};
pub use submission::{ClientMeta, Selection, SubmissionPayload, SubmitAck};

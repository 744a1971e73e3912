pub mod consent;
pub mod controller;
pub mod session;

pub use consent::ConsentForm;
pub use controller::{build_payload, SessionController, SurveyOptions};
pub use session::{Session, Status, StatusKind, SubmissionState};

pub mod survey_client;

pub use survey_client::{HttpSurveyClient, ManifestQuery, SurveyEndpoint};

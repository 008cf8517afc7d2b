pub mod form_status;
pub mod submission;

pub use form_status::FormStatus;
pub use submission::Submission;

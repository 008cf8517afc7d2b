pub mod form_status;
pub mod stats;
pub mod submissions;

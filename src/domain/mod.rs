pub mod error;
pub mod preview_parameters;
pub mod preview_session;
pub mod target_event;

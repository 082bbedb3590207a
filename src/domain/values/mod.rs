pub mod alert_event;
pub mod alert_type;
pub mod job_state;
pub mod recommendation;
pub mod severity;
pub mod sub_scores;
pub mod weight_profile;

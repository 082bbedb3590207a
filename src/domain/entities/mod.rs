pub mod alert;
pub mod batch_job;
pub mod composite_score;
pub mod deal;
pub mod thesis;
pub mod thesis_match;

pub mod alert_repository;
pub mod deal_repository;
pub mod job_store;
pub mod match_repository;
pub mod notification_transport;
pub mod profile_repository;
pub mod score_repository;
pub mod scoring_oracle;
pub mod thesis_repository;

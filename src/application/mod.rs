pub mod alert_engine;
pub mod alerts;
pub mod batch;
pub mod deals;
pub mod dispatch;
pub mod external;
pub mod matching;
pub mod scoring;
pub mod theses;

pub mod cv_data;
pub mod job_post;
pub mod job_report;
pub mod match_score;
pub mod subscription;
pub mod user;

pub mod billing_dto;
pub mod clerk_dto;
pub mod matching_dto;
pub mod report_dto;
pub mod stripe_dto;

pub mod messages;
pub mod worker;

pub mod cloudwatch;
pub mod connection;
pub mod invoke;

pub mod adapter;
pub mod calculator;
pub mod integration;
pub mod payout;
pub mod rule;
pub mod sheet;
pub mod types;

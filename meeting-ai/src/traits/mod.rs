pub mod account;
pub mod calendar;
pub mod notetaker;

pub mod root;
pub mod options;
pub mod address;
pub mod uploads;
pub mod registrations;
pub mod payments;
pub mod proxy;
pub mod auth;
pub mod admin;

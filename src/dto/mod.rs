pub mod admin;
pub mod auth;
pub mod bookings;
pub mod payments;
pub mod search;
pub mod tutors;

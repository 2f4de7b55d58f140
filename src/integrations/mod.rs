//! Clients for the hosted services the API talks to.

pub mod mailer;
pub mod midtrans;

pub mod audit_logs;
pub mod bookings;
pub mod cities;
pub mod districts;
pub mod notification_outbox;
pub mod payments;
pub mod profiles;
pub mod provinces;
pub mod reviews;
pub mod tutor_availability;
pub mod tutor_profiles;
pub mod tutor_wallets;
pub mod villages;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use cities::Entity as Cities;
pub use districts::Entity as Districts;
pub use notification_outbox::Entity as NotificationOutbox;
pub use payments::Entity as Payments;
pub use profiles::Entity as Profiles;
pub use provinces::Entity as Provinces;
pub use reviews::Entity as Reviews;
pub use tutor_availability::Entity as TutorAvailability;
pub use tutor_profiles::Entity as TutorProfiles;
pub use tutor_wallets::Entity as TutorWallets;
pub use villages::Entity as Villages;

pub mod approval_service;
pub mod booking_service;
pub mod notification_service;
pub mod payment_service;
pub mod search_service;
pub mod tutor_service;
pub mod wilayah_service;

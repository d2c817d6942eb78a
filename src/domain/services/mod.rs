pub mod auth_service;
pub mod guest_list;
pub mod guest_status;
pub mod otp_service;
pub mod room_assignment;

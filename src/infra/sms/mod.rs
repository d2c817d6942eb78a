pub mod log_sms_service;

pub mod error_messages;
pub mod password_utils;
pub mod validation;

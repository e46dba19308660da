// api/src/web/handlers/mod.rs

pub mod course_handlers;
pub mod lesson_handlers;
pub mod paypal_handlers;
pub mod quiz_handlers;
pub mod registration_handlers;
pub mod review_handlers;
pub mod user_handlers;

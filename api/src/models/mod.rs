// api/src/models/mod.rs

//! Database entities and their JSON shapes.

pub mod course;
pub mod lesson;
pub mod profile;
pub mod quiz;
pub mod registration;
pub mod review;
pub mod user;

pub use course::{Course, MyCourse, PriceInfo};
pub use lesson::{Lesson, Video};
pub use profile::Profile;
pub use quiz::{Question, Quiz};
pub use registration::{RegisteredUser, Registration, RegistrationDetail, RegistrationStatus};
pub use review::{Review, ReviewWithAuthor};
pub use user::{Role, User};

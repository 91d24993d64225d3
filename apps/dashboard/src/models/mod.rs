pub mod resume;
pub mod user;

pub use resume::{ResumeDraft, ResumeRecord};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, User};

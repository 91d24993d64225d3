// Thin Resource API callers. All HTTP goes through `ApiClient`.

pub mod auth;
pub mod resumes;

pub use auth::AuthService;
pub use resumes::ResumeService;

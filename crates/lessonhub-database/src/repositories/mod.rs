//! Repository implementations for all LessonHub entities.

pub mod attempt;
pub mod audit;
pub mod catalog;
pub mod code;
pub mod grant;
pub mod progress;
pub mod student_lesson;

pub use attempt::ExamAttemptRepository;
pub use audit::AuditLogRepository;
pub use catalog::CatalogRepository;
pub use code::AccessCodeRepository;
pub use grant::GrantRepository;
pub use progress::ProgressRepository;
pub use student_lesson::StudentLessonRepository;

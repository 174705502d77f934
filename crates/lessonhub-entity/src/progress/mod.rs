//! Lesson progress entity, status state machine, and exam attempts.

pub mod attempt;
pub mod model;
pub mod status;
pub mod view;

pub use attempt::ExamAttempt;
pub use model::LessonProgress;
pub use status::ProgressStatus;
pub use view::StudentLessonView;

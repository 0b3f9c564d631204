//! In-memory course index
//!
//! # Components
//!
//! - `SharedCourseIndex`: mutex-guarded aggregate written by concurrent tasks
//! - `CourseIndex`: owned, ordered snapshot handed to the document writer

mod course_index;

pub use course_index::{CourseIndex, SharedCourseIndex};

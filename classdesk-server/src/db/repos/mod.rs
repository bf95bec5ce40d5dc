//! Repository implementations for database access
//!
//! One repository per table. Each borrows the shared pool and follows
//! these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Handles conflicts via unique constraints (no check-then-insert)
//! - Uses transactions for multi-table writes

pub mod admins;
pub mod classes;
pub mod courses;
pub mod enrollments;
pub mod error;
pub mod logs;
pub mod students;
pub mod transactions;
pub mod waitlist;

pub use admins::{Admin, AdminRepo};
pub use classes::{
    Class, ClassFilter, ClassPatch, ClassRepo, ClassWithCount, ClassWithCourse, NewClass,
    RosterEntry,
};
pub use courses::{Course, CourseRepo, NewCourse};
pub use enrollments::{Enrollment, EnrollmentRepo, EnrollmentWithClass};
pub use error::DbError;
pub use logs::{LogEntry, LogRepo};
pub use students::{NewStudent, Student, StudentPatch, StudentRepo};
pub use transactions::{InvoiceContext, PaidCheckout, Transaction, TransactionRepo};
pub use waitlist::{WaitlistEntry, WaitlistEntryWithStudent, WaitlistRepo};

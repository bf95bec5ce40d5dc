//! Route handlers organized by resource

pub mod admins;
pub mod checkout;
pub mod classes;
pub mod courses;
pub mod enrollments;
pub mod health;
pub mod invoices;
pub mod status;
pub mod students;
pub mod transactions;
pub mod waitlist;

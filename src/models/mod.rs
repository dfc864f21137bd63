//! Data models for the circulation server

pub mod book;
pub mod borrower;
pub mod loan;

// Re-export commonly used types
pub use book::{Book, BookDto, BookInventory, NewBook, RegisterBook};
pub use borrower::{Borrower, NewBorrower, RegisterBorrower};
pub use loan::{Loan, NewLoan};

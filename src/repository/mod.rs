//! Persistence layer
//!
//! The department repository owns the aggregate read/write logic over the
//! four HR tables; the employee repository is the single-table
//! collaborator it delegates employee upserts to.

pub mod department;
pub mod employee;
mod runs;

pub use department::DepartmentRepository;
pub use employee::EmployeeRepository;

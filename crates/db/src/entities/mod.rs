//! `SeaORM` entity definitions.

pub mod allocations;
pub mod expenses;
pub mod invoices;
pub mod projects;
pub mod sea_orm_active_enums;
pub mod users;

//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attendance_log;
pub mod compensation_rate;
pub mod payroll_item;
pub mod payroll_period;
pub mod user;

// Re-export specific types to avoid conflicts
pub use attendance_log::{
    Column as AttendanceLogColumn, Entity as AttendanceLog, Model as AttendanceLogModel,
};
pub use compensation_rate::{
    Column as CompensationRateColumn, Entity as CompensationRate, Model as CompensationRateModel,
};
pub use payroll_item::{
    Column as PayrollItemColumn, Entity as PayrollItem, Model as PayrollItemModel,
};
pub use payroll_period::{
    Column as PayrollPeriodColumn, Entity as PayrollPeriod, Model as PayrollPeriodModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};

//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod collection_action;
pub mod invoice;
pub mod ledger_transaction;
pub mod student;

// Re-export specific types to avoid conflicts
pub use collection_action::{
    Column as CollectionActionColumn, Entity as CollectionAction, Model as CollectionActionModel,
};
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use ledger_transaction::{
    Column as LedgerTransactionColumn, Entity as LedgerTransaction,
    Model as LedgerTransactionModel,
};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};

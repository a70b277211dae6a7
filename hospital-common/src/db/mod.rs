//! Database access: connection, schema, fixtures and introspection

pub mod connect;
pub mod fixtures;
pub mod introspect;
pub mod models;
pub mod schema;
pub mod table_schemas;

pub use connect::*;
pub use introspect::*;
pub use models::*;
pub use schema::*;
pub use table_schemas::*;

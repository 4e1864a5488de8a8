pub mod alias_info;
pub mod schema;
pub mod value;

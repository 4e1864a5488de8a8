#[cfg(test)]
mod test;

pub mod schema_info;
pub mod special_cases;

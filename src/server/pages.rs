//! Static HTML form pages

pub const INDEX: &str = include_str!("../../templates/index.html");
pub const INSERT: &str = include_str!("../../templates/insert.html");
pub const REMOVE: &str = include_str!("../../templates/remove.html");
pub const UPDATE: &str = include_str!("../../templates/update.html");
pub const READ: &str = include_str!("../../templates/read.html");

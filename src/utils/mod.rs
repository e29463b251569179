pub mod de;
pub mod sanitize;

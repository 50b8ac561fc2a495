pub mod record;
pub mod session;

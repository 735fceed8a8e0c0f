pub mod seen;
pub mod sync;

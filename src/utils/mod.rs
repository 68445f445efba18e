pub mod fmt;
pub mod time;

pub use fmt::fmt_minutes;

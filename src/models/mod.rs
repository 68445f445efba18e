pub mod assignment;
pub mod break_interval;
pub mod break_type;
pub mod certification;
pub mod event_kind;
pub mod geo_event;
pub mod session;
pub mod session_state;

pub mod assign;
pub mod assignments;
pub mod backup;
pub mod breaks;
pub mod certify;
pub mod checkin;
pub mod checkout;
pub mod config;
pub mod db;
pub mod export;
pub mod history;
pub mod init;
pub mod locate;
pub mod log;
pub mod sessions;
pub mod sync;

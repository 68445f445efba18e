pub mod backup;
pub mod breaks;
pub mod certify;
pub mod geofence;
pub mod log;
pub mod machine;
pub mod payable;
pub mod reconcile;
pub mod service;

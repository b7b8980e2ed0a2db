pub mod dispatch;
pub mod reconcile;
pub mod scan;
pub mod tables;
pub mod tenants;

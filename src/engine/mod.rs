pub mod chat;
pub mod dispatch;
pub mod fare;
pub mod ledger;
pub mod lifecycle;

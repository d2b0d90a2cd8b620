pub mod chat;
pub mod dispatch;
pub mod driver;
pub mod earning;
pub mod promotion;
pub mod trip;

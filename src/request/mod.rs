//! Request façades over a [`Database`](crate::Database).
//!
//! Each façade borrows the database and funnels its statements through the
//! worker channel: reads as [`Access::Read`](crate::storage::Access::Read),
//! upserts as [`Access::Write`](crate::storage::Access::Write).

pub mod applications;
pub mod markets;
pub mod prices;

pub use applications::Applications;
pub use markets::{ForexMarkets, Markets};
pub use prices::Prices;

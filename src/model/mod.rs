//! Domain value types persisted by the store.

pub mod application;
pub mod epic;
pub mod market;
pub mod price;

pub use application::{Allowance, ApiKey, AppStatus, Application, Permission};
pub use epic::{Currency, Epic};
pub use market::{Forex, Market, MarketDetail, MarketType};
pub use price::{Point, Price};

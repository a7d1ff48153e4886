//! Garden simulation for the rhythm garden.
//!
//! A [`Garden`] consumes one sensor [`Reading`](garden_protocol::Reading) per
//! tick. Each tick grows every plant, decides which plants sing, and plants a
//! new one when the trigger goes from released to pressed.
//!
//! ```
//! use garden_protocol::Reading;
//! use garden_sim::{Garden, GardenConfig, SimTime};
//!
//! let mut garden = Garden::new(GardenConfig { seed: Some(7), ..Default::default() }).unwrap();
//! let outcome = garden.tick(&Reading::new(500, 500, true), SimTime::ZERO);
//! assert!(outcome.planted.is_some());
//! assert_eq!(garden.len(), 1);
//! ```

mod category;
mod error;
mod garden;
pub mod joystick;
mod plant;
mod position;
mod time;
mod trigger;
mod voice;

pub use category::*;
pub use error::*;
pub use garden::*;
pub use plant::*;
pub use position::*;
pub use time::*;
pub use trigger::*;
pub use voice::*;

#[macro_use]
extern crate serde;

mod ballot;
mod codec;
mod commission;
mod config;
mod crypto;
pub mod ecies_ed25519;
mod entity;
mod error;
mod registration;
mod results;
mod util;
mod voter;

pub use ballot::*;
pub use codec::*;
pub use commission::*;
pub use config::*;
pub use crypto::*;
pub use ecies_ed25519::{EciesEd25519, EciesPublicKey};
pub use entity::*;
pub use error::*;
pub use registration::*;
pub use results::*;
pub use voter::*;

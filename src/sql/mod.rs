//! Safe SQL builder: identifiers from the registry only, values as parameters.

mod builder;
mod ident;
pub mod params;
pub use builder::*;
pub use ident::Ident;
pub use params::*;

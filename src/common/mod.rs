pub mod config;

pub use config::{CollisionPolicy, ExtraAccel, SimConfig, Tolerances};

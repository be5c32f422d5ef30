mod payments_world;
mod setups;
mod steps;

pub use payments_world::PaymentsWorld;

// Domain layer: the Espacio schema and the ports the storage adapters implement.

pub mod model;
pub mod ports;

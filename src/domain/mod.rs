// Domain layer: option kinds, selection records, events and the ports the
// checkout talks to. No knowledge of concrete stores or configuration files.

pub mod codes;
pub mod model;
pub mod ports;

pub mod arrivals;
pub mod config;
pub mod display;
pub mod fetch;
pub mod model;
pub mod output;
pub mod parser;
pub mod runtime;
pub mod weather;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}

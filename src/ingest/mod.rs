/// External data sources for the offline feature pipeline.

pub mod gkd;
pub mod hnd;
pub mod meteo;

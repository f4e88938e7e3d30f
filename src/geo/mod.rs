pub mod country;
pub mod dataset;
pub mod http;
pub mod lookup;
pub mod projection;

pub mod model;
pub mod utility;

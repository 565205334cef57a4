pub mod layer;
pub mod markers;
pub mod raster;
pub mod route;
pub mod symbology;

pub use layer::*;
pub use markers::*;
pub use raster::*;
pub use route::*;
pub use symbology::*;

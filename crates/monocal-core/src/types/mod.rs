//! Calibration data model.

mod colinear;
mod coord;
mod intrinsic;
mod pose;
mod record;
mod result;

pub use colinear::*;
pub use coord::*;
pub use intrinsic::*;
pub use pose::*;
pub use record::*;
pub use result::*;

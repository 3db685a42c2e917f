mod helpers;
mod predict;
mod scan;

pub(crate) use predict::{PredictArgs, cmd_predict};
pub(crate) use scan::cmd_scan;

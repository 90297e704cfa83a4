//! Raster tool service.
//!
//! Exposes `analyze_tiff`, `crop_image`, `get_ndvi` and `get_dem` as
//! JSON-RPC tools on `POST /mcp`. Tool failures are reported inside the
//! result payload as `{error, success: false}`; only protocol faults become
//! JSON-RPC errors.

mod error;
mod http;
mod scratch;
#[cfg(test)]
mod testutil;
mod tools;

pub use error::{Error, Result, ToolError};
pub use http::{app, serve};
pub use scratch::clear_dir;
pub use tools::{ANALYZE_TIFF, CROP_IMAGE, GET_DEM, GET_NDVI, ToolRouter, ToolRouterConfig};

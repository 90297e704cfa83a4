//! Raster tool dispatch.
//!
//! The router owns the closed set of tools, validates argument shapes by
//! deserializing into per-tool structs, and turns every outcome into a
//! payload value. Raster failures never escape as errors.

use std::path::PathBuf;
use std::sync::Arc;

use mcp::{CallToolResult, Tool};
use raster::CropWindow;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use storage::MetadataSink;
use tracing::{info, warn};

use crate::error::ToolError;

pub const ANALYZE_TIFF: &str = "analyze_tiff";
pub const CROP_IMAGE: &str = "crop_image";
pub const GET_NDVI: &str = "get_ndvi";
pub const GET_DEM: &str = "get_dem";

#[derive(Debug, Deserialize)]
struct AnalyzeArgs {
    filepath: String,
}

#[derive(Debug, Deserialize)]
struct CropArgs {
    filepath: String,
    #[serde(flatten)]
    window: CropWindow,
}

#[derive(Debug, Deserialize)]
struct PointArgs {
    filepath: String,
    x: f64,
    y: f64,
}

/// Configuration for a [`ToolRouter`].
pub struct ToolRouterConfig {
    /// Directory receiving cropped PNGs.
    pub output_dir: PathBuf,
    /// Receiver of metadata produced by `analyze_tiff`.
    pub sink: Arc<dyn MetadataSink + Send + Sync>,
}

/// Dispatches tool calls to the raster operations.
pub struct ToolRouter {
    output_dir: PathBuf,
    sink: Arc<dyn MetadataSink + Send + Sync>,
}

impl ToolRouter {
    pub fn new(config: ToolRouterConfig) -> Self {
        Self {
            output_dir: config.output_dir,
            sink: config.sink,
        }
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Definitions advertised by `tools/list`.
    pub fn tools(&self) -> Vec<Tool> {
        let point_schema = schema(&[("filepath", "string"), ("x", "number"), ("y", "number")]);
        vec![
            Tool {
                name: ANALYZE_TIFF.to_string(),
                description: Some(
                    "Analyzes a TIFF/JP2 file, stores its metadata and returns its extent."
                        .to_string(),
                ),
                input_schema: schema(&[("filepath", "string")]),
            },
            Tool {
                name: CROP_IMAGE.to_string(),
                description: Some(
                    "Crops the raster to the given coordinates and converts it to PNG."
                        .to_string(),
                ),
                input_schema: schema(&[
                    ("filepath", "string"),
                    ("minx", "number"),
                    ("miny", "number"),
                    ("maxx", "number"),
                    ("maxy", "number"),
                ]),
            },
            Tool {
                name: GET_NDVI.to_string(),
                description: Some(
                    "Calculates the mean NDVI and the NDVI at the given coordinates.".to_string(),
                ),
                input_schema: point_schema.clone(),
            },
            Tool {
                name: GET_DEM.to_string(),
                description: Some("Returns the DEM elevation at the given coordinates.".to_string()),
                input_schema: point_schema,
            },
        ]
    }

    /// Execute a tool and wrap its payload.
    pub fn call(&self, name: &str, arguments: Map<String, Value>) -> CallToolResult {
        match self.dispatch(name, arguments) {
            Ok(payload) => {
                info!(tool = name, "tool call succeeded");
                CallToolResult::from_payload(payload, false)
            }
            Err(e) => {
                warn!(tool = name, "tool call failed: {e}");
                CallToolResult::from_payload(failure(&e), true)
            }
        }
    }

    fn dispatch(&self, name: &str, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        match name {
            ANALYZE_TIFF => {
                let args: AnalyzeArgs = parse_args(name, arguments)?;
                to_payload(raster::analyze(&args.filepath, self.sink.as_ref())?)
            }
            CROP_IMAGE => {
                let args: CropArgs = parse_args(name, arguments)?;
                to_payload(raster::crop(&args.filepath, args.window, &self.output_dir)?)
            }
            GET_NDVI => {
                let args: PointArgs = parse_args(name, arguments)?;
                to_payload(raster::ndvi(&args.filepath, args.x, args.y)?)
            }
            GET_DEM => {
                let args: PointArgs = parse_args(name, arguments)?;
                to_payload(raster::dem(&args.filepath, args.x, args.y)?)
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

/// Payload for a failed call.
pub fn failure(error: &ToolError) -> Value {
    json!({ "error": error.to_string(), "success": false })
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments)).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

fn to_payload(report: impl serde::Serialize) -> Result<Value, ToolError> {
    serde_json::to_value(report).map_err(|e| ToolError::Aborted(e.to_string()))
}

fn schema(fields: &[(&str, &str)]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(name, ty)| (name.to_string(), json!({ "type": ty })))
        .collect();
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

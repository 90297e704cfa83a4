//! The closed set of tools the orchestrator may invoke.

/// Name, description and argument names of one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub arguments: Vec<String>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str, arguments: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Read-only tool registry, built once at startup.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::raster()
    }
}

impl ToolRegistry {
    pub fn new(specs: Vec<ToolSpec>) -> Self {
        Self { specs }
    }

    /// The four raster tools served by the tool service.
    pub fn raster() -> Self {
        Self::new(vec![
            ToolSpec::new(
                "analyze_tiff",
                "Analyzes the TIFF file and returns its metadata",
                &["filepath"],
            ),
            ToolSpec::new(
                "crop_image",
                "Crops the TIFF file by the given coordinates and converts it to png.",
                &["filepath", "minx", "miny", "maxx", "maxy"],
            ),
            ToolSpec::new(
                "get_ndvi",
                "Calculates the mean ndvi and given coordinates ndvi.",
                &["filepath", "x", "y"],
            ),
            ToolSpec::new(
                "get_dem",
                "Returns the elevation of the DEM at the given coordinates.",
                &["filepath", "x", "y"],
            ),
        ])
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

use std::{fs, path::Path};

use crate::{WildfireError, WildfireModel, WildfireSpec};

/// Load a wildfire scenario from YAML on disk.
pub fn load_yaml(path: impl AsRef<Path>) -> Result<WildfireSpec, WildfireError> {
    let yaml = fs::read_to_string(path)?;
    let spec: WildfireSpec = serde_yaml::from_str(&yaml)?;
    Ok(spec)
}

/// Load and compile a wildfire scenario from a YAML file.
pub fn compile_yaml(path: impl AsRef<Path>) -> Result<WildfireModel, WildfireError> {
    let spec = load_yaml(path)?;
    spec.compile()
}

/// Serialize and write a wildfire scenario to YAML.
pub fn save_yaml(path: impl AsRef<Path>, spec: &WildfireSpec) -> Result<(), WildfireError> {
    let yaml = serde_yaml::to_string(spec)?;
    fs::write(path, yaml)?;
    Ok(())
}

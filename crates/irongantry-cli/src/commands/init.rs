use super::{json_pretty, EXIT_SUCCESS};
use irongantry_core::Engine;
use std::path::Path;

pub fn run(root: &Path, name: &str, json: bool) -> Result<u8, String> {
    let engine = Engine::new(root);
    let path = engine.init(name).map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "status": "created",
            "path": path,
            "project": name,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("created {} for project '{name}'", path.display());
    }
    Ok(EXIT_SUCCESS)
}

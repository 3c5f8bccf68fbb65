use super::{json_pretty, EXIT_SUCCESS};
use irongantry_core::Engine;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> Result<u8, String> {
    let engine = Engine::new(root);

    // No spinner here: environment creation and package installation stream
    // their own output on the inherited stdio.
    engine.build().map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({ "status": "built" });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("build complete");
    }
    Ok(EXIT_SUCCESS)
}

use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use irongantry_core::Engine;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> Result<u8, String> {
    let engine = Engine::new(root);

    let pb = if json {
        None
    } else {
        Some(spinner("packaging project..."))
    };

    let archive = match engine.ship() {
        Ok(path) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "project shipped");
            }
            path
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "ship failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "status": "shipped",
            "archive": archive,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("shipped: {}", archive.display());
    }
    Ok(EXIT_SUCCESS)
}

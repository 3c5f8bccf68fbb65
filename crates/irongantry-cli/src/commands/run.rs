use super::EXIT_FAILURE;
use irongantry_core::Engine;
use std::path::Path;

pub fn run(root: &Path) -> Result<u8, String> {
    let engine = Engine::new(root);
    let code = engine.run().map_err(|e| e.to_string())?;
    // Propagate the child's exit status as our own.
    Ok(u8::try_from(code).unwrap_or(EXIT_FAILURE))
}

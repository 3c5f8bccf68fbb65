use super::{json_pretty, EXIT_SUCCESS};

pub fn run(json: bool) -> Result<u8, String> {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        let payload = serde_json::json!({
            "name": "irongantry",
            "version": version,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("irongantry v{version}");
    }
    Ok(EXIT_SUCCESS)
}

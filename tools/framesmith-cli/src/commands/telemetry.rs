//! Summarize a telemetry log.

use std::path::PathBuf;

use framesmith_telemetry::summarize_file;

pub fn run(log: PathBuf, json: bool) -> anyhow::Result<()> {
    let summary = summarize_file(&log)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Telemetry: {}", log.display());
        print!("{summary}");
    }
    Ok(())
}

use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format.
/// `data` fields are merged into the JSON object; text mode prints `details` lines.
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Value,
    details: &[String],
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Value::Object(fields)) = (response.as_object_mut(), data) {
                target.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            for line in details {
                println!("  {}", line);
            }
        }
    }
    Ok(())
}

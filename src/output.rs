use crate::cli::OutputFormat;
use deployer::error::get_error_info;
use deployer::DeployError;
use serde_json::json;

pub fn emit_output(output: &OutputFormat, command: &str, payload: serde_json::Value) {
    match output {
        OutputFormat::Text => payload
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| println!("{payload}"), |msg| println!("{msg}")),
        OutputFormat::Json => println!(
            "{}",
            json!({
                "command": command,
                "status": "ok",
                "payload": payload,
            })
        ),
    }
}

#[must_use]
pub fn error_payload(command: &str, error: &DeployError) -> serde_json::Value {
    let code = error.code();
    let fix = get_error_info(code).map(|(_, fix)| fix);
    json!({
        "command": command,
        "status": "error",
        "code": code,
        "message": error.to_string(),
        "fix": fix,
    })
}

pub fn emit_error(output: &OutputFormat, command: &str, error: &DeployError) {
    match output {
        OutputFormat::Text => {
            eprintln!("error [{}]: {error}", error.code());
            if let Some((_, fix)) = get_error_info(error.code()) {
                eprintln!("  hint: {fix}");
            }
        }
        OutputFormat::Json => println!("{}", error_payload(command, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::error_payload;
    use deployer::DeployError;

    #[test]
    fn error_payload_carries_code_and_fix() {
        let payload = error_payload(
            "deploy",
            &DeployError::InitError("no compiled artifacts".to_string()),
        );
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["code"], "NOTFOUND");
        assert_eq!(payload["message"], "Initializer error: no compiled artifacts");
        assert!(payload["fix"].as_str().is_some());
    }
}

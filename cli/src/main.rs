use std::io::Read as _;

use anyhow::Context;
use uitrack::prelude::{Tracker, TrackerConfig};

mod cli;
mod init;

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    let args = init::init();
    log::debug!("{CRATE_NAME} {CRATE_VERSION}");
    log::debug!("Using project root: {}", args.root.display());

    let params = if args.params == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read tool parameters from stdin")?;
        parse_params(&input)?
    } else {
        parse_params(&args.params)?
    };

    let tracker = Tracker::new(
        TrackerConfig::default()
            .root(args.root)
            .run_id_length(args.run_id_length),
    );

    match tracker.invoke_by_name(&args.tool, params) {
        Ok(response) => {
            println!("{}", render(&response, args.compact)?);
            Ok(())
        }
        Err(e) => {
            let error = serde_json::json!({
                "error": {
                    "kind": e.kind(),
                    "message": e.to_string(),
                }
            });
            println!("{}", render(&error, args.compact)?);
            Err(anyhow::Error::new(e).context(format!("`{}` failed", args.tool)))
        }
    }
}

fn parse_params(input: &str) -> anyhow::Result<serde_json::Value> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(input).context("Tool parameters must be a JSON object")
}

fn render(value: &serde_json::Value, compact: bool) -> anyhow::Result<String> {
    if compact {
        serde_json::to_string(value).context("Failed to encode response")
    } else {
        serde_json::to_string_pretty(value).context("Failed to encode response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_params_are_null() {
        assert_eq!(parse_params("  \n").unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn params_must_be_json() {
        assert!(parse_params("scenarioSlug=checkout").is_err());
        assert_eq!(
            parse_params(r#"{"scenarioSlug": "checkout"}"#).unwrap()["scenarioSlug"],
            "checkout"
        );
    }
}

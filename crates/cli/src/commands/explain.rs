use expert_validation::{parse_rules, Rule};
use std::process::ExitCode;

/// Print each rule of `spec` with its parameters and how it resolves
pub fn run(spec: &str) -> anyhow::Result<ExitCode> {
    for line in explain(spec) {
        println!("{}", line);
    }
    Ok(ExitCode::SUCCESS)
}

fn explain(spec: &str) -> Vec<String> {
    parse_rules(spec)
        .iter()
        .enumerate()
        .map(|(index, invocation)| {
            let status = match Rule::resolve(invocation) {
                Ok(Some(_)) => "ok".to_string(),
                Ok(None) => "unknown rule (ignored unless --strict)".to_string(),
                Err(reason) => format!("invalid parameters: {}", reason),
            };
            format!(
                "{}. {} {:?} -> {}",
                index + 1,
                invocation.name,
                invocation.params,
                status
            )
        })
        .collect()
}

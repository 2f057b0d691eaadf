//! Walk through the rule language with an in-memory user table

use expert_validation::{
    parse_rules, InMemoryExistenceChecker, Locale, RuleSpec, ValidationInput, Validator,
    ValidatorConfig,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("expert-validation demo");
    println!("======================\n");

    demo_parsing();
    demo_sign_up().await?;
    demo_portuguese().await?;

    Ok(())
}

fn demo_parsing() {
    println!("Parsing \"required|min:3|exists:users,email\":");
    for invocation in parse_rules("required|min:3|exists:users,email") {
        println!("  {:<10} {:?}", invocation.name, invocation.params);
    }
    println!();
}

fn sign_up_rules() -> RuleSpec {
    let mut rules = RuleSpec::new();
    rules.insert("name".into(), "required|string|min:3|max:40".into());
    rules.insert("email".into(), "required|string|exists:users,email".into());
    rules.insert("referrer".into(), "nullable|not_exists:users,email".into());
    rules.insert("age".into(), "nullable|integer".into());
    rules
}

async fn demo_sign_up() -> Result<(), Box<dyn std::error::Error>> {
    let users = InMemoryExistenceChecker::new()
        .with("users", "email", json!("taken@example.com"))
        .with("users", "email", json!("friend@example.com"));
    let mut validator = Validator::new(users);

    let valid: ValidationInput = serde_json::from_value(json!({
        "name": "Ada",
        "email": "ada@example.com",
        "referrer": "friend@example.com",
        "age": null
    }))?;
    validator.validate(&valid, &sign_up_rules()).await?;
    println!("Valid sign-up passes: {}", validator.passes());

    let invalid: ValidationInput = serde_json::from_value(json!({
        "name": 12,
        "email": "taken@example.com",
        "referrer": "stranger@example.com",
        "age": "37"
    }))?;
    validator.validate(&invalid, &sign_up_rules()).await?;
    println!("Invalid sign-up:\n{}\n", validator.errors());

    Ok(())
}

async fn demo_portuguese() -> Result<(), Box<dyn std::error::Error>> {
    let mut validator = Validator::without_database()
        .with_config(ValidatorConfig::new().with_locale(Locale::PtBr));

    validator
        .validate(&ValidationInput::new(), [("nome", "required|min:3")])
        .await?;

    println!("{}", serde_json::to_string_pretty(&validator.errors().messages())?);
    Ok(())
}

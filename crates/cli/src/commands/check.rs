use crate::OutputFormat;
use anyhow::{bail, Context};
use clap::Args;
use expert_validation::{
    ExistenceChecker, InMemoryExistenceChecker, Locale, MessageCatalog, NoDatabase, RuleSpec,
    ValidationErrors, ValidationInput, Validator, ValidatorConfig,
};
use expert_validation_db::{CheckerConfig, PgExistenceChecker};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON object holding the field values
    #[arg(long)]
    pub data: PathBuf,

    /// YAML or JSON mapping of field to rule spec
    #[arg(long)]
    pub rules: PathBuf,

    /// YAML message overrides, applied over the locale's catalog
    #[arg(long)]
    pub messages: Option<PathBuf>,

    /// Built-in catalog to start from (en, pt-br)
    #[arg(long)]
    pub locale: Option<Locale>,

    /// Fail on unknown rule names instead of ignoring them
    #[arg(long)]
    pub strict: bool,

    /// PostgreSQL URL answering exists/not_exists rules
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// YAML table fixtures (table: column: [values]); takes precedence over --database-url
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub async fn run(args: CheckArgs) -> anyhow::Result<ExitCode> {
    let data = load_data(&args.data)?;
    let rules = load_rules(&args.rules)?;

    let mut config = ValidatorConfig::from_env().context("Invalid validator environment")?;
    if args.strict {
        config.strict_rules = true;
    }
    if let Some(locale) = args.locale {
        config.locale = locale;
    }

    let catalog = match &args.messages {
        Some(path) => load_catalog(path, config.catalog())?,
        None => config.catalog(),
    };

    let checker = build_checker(&args).await?;
    let mut validator = Validator::with_shared_checker(checker)
        .with_catalog(catalog)
        .with_config(config);

    tracing::info!(fields = rules.len(), "validating {}", args.data.display());
    validator
        .validate(&data, &rules)
        .await
        .context("Validation could not complete")?;

    print_errors(validator.errors(), args.format)?;

    Ok(if validator.fails() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn load_data(path: &Path) -> anyhow::Result<ValidationInput> {
    let content = read(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    if !value.is_object() {
        bail!("{} must contain a JSON object of field values", path.display());
    }
    Ok(serde_json::from_value(value)?)
}

pub fn load_rules(path: &Path) -> anyhow::Result<RuleSpec> {
    let content = read(path)?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("{} must map field names to rule specs", path.display()))
}

fn load_catalog(path: &Path, base: MessageCatalog) -> anyhow::Result<MessageCatalog> {
    let content = read(path)?;
    MessageCatalog::from_yaml_str_over(base, &content)
        .with_context(|| format!("Invalid message catalog {}", path.display()))
}

async fn build_checker(args: &CheckArgs) -> anyhow::Result<Arc<dyn ExistenceChecker>> {
    if let Some(path) = &args.fixtures {
        let checker = InMemoryExistenceChecker::from_yaml_str(&read(path)?)
            .with_context(|| format!("Invalid fixtures {}", path.display()))?;
        return Ok(Arc::new(checker));
    }

    if let Some(url) = &args.database_url {
        let checker = PgExistenceChecker::connect_with_config(url, CheckerConfig::default())
            .await
            .context("Failed to connect to the database")?;
        return Ok(Arc::new(checker));
    }

    Ok(Arc::new(NoDatabase))
}

fn print_errors(errors: &ValidationErrors, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&errors.messages())?);
        }
        OutputFormat::Text if errors.is_empty() => println!("All fields passed."),
        OutputFormat::Text => {
            for (field, field_errors) in errors.iter() {
                println!("{}:", field);
                for error in field_errors {
                    println!("  - {}", error.message);
                }
            }
        }
    }
    Ok(())
}

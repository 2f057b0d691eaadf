//! Validator: runs each field's rule chain and collects rendered errors

use crate::config::ValidatorConfig;
use crate::error::{ValidationError, ValidationErrors, ValidatorError};
use crate::existence::{ExistenceChecker, NoDatabase};
use crate::messages::MessageCatalog;
use crate::parser::{parse_rules, RuleInvocation};
use crate::rules::{Rule, RuleKind, RuleOutcome};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Field values under validation; a missing key is an absent value
pub type ValidationInput = HashMap<String, Value>;

/// Field name to raw rule spec, in evaluation order
pub type RuleSpec = IndexMap<String, String>;

/// A resolved rule together with the invocation it came from
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: Rule,
    invocation: RuleInvocation,
}

#[derive(Debug)]
struct FieldPlan {
    field: String,
    rules: Vec<CompiledRule>,
}

/// How a field's rule chain ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Done,
    StoppedByNullable,
}

/// Rule-string driven validator.
///
/// ```no_run
/// # async fn run() -> Result<(), expert_validation::ValidatorError> {
/// use expert_validation::{ValidationInput, Validator};
/// use serde_json::json;
///
/// let data = ValidationInput::from([("name".to_string(), json!("Al"))]);
///
/// let mut validator = Validator::without_database();
/// validator.validate(&data, [("name", "required|string|min:3")]).await?;
///
/// assert!(validator.fails());
/// # Ok(())
/// # }
/// ```
pub struct Validator {
    checker: Arc<dyn ExistenceChecker>,
    catalog: Arc<MessageCatalog>,
    custom_catalog: bool,
    config: ValidatorConfig,
    errors: ValidationErrors,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("custom_catalog", &self.custom_catalog)
            .field("errors", &self.errors)
            .finish()
    }
}

impl Validator {
    /// Create a validator that answers existence rules with `checker`
    pub fn new<C>(checker: C) -> Self
    where
        C: ExistenceChecker + 'static,
    {
        Self::with_shared_checker(Arc::new(checker))
    }

    /// Create a validator around a checker that is shared with other owners
    pub fn with_shared_checker(checker: Arc<dyn ExistenceChecker>) -> Self {
        let config = ValidatorConfig::default();
        Self {
            checker,
            catalog: Arc::new(config.catalog()),
            custom_catalog: false,
            config,
            errors: ValidationErrors::new(),
        }
    }

    /// Create a validator with no data store; existence rules fail the run
    pub fn without_database() -> Self {
        Self::new(NoDatabase)
    }

    /// Use a specific message catalog instead of the locale's built-in one
    pub fn with_catalog(mut self, catalog: MessageCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self.custom_catalog = true;
        self
    }

    /// Apply configuration. The locale only picks the catalog when none was
    /// supplied through [`with_catalog`](Self::with_catalog).
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        if !self.custom_catalog {
            self.catalog = Arc::new(config.catalog());
        }
        self.config = config;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    /// Validate `data` against `rules`, replacing any previous result.
    ///
    /// Rule failures are read back through [`fails`](Self::fails) and
    /// [`errors`](Self::errors). `Err` is reserved for configuration and
    /// data-store failures; on `Err` the previous result is already cleared.
    #[tracing::instrument(skip_all, fields(fields = tracing::field::Empty))]
    pub async fn validate<I, K, V>(
        &mut self,
        data: &ValidationInput,
        rules: I,
    ) -> Result<(), ValidatorError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        self.errors.clear();

        let plans = self.compile(rules)?;
        tracing::Span::current().record("fields", plans.len());

        let errors = self.run(&plans, data).await?;
        self.errors = errors;
        Ok(())
    }

    /// Validate without touching this validator's stored result
    pub async fn check<I, K, V>(
        &self,
        data: &ValidationInput,
        rules: I,
    ) -> Result<ValidationErrors, ValidatorError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let plans = self.compile(rules)?;
        self.run(&plans, data).await
    }

    /// True when the last run recorded at least one error
    pub fn fails(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn passes(&self) -> bool {
        !self.fails()
    }

    /// Errors from the last run
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Drop the stored result
    pub fn reset(&mut self) {
        self.errors.clear();
    }

    /// Parse and resolve every field's spec before anything is evaluated
    fn compile<I, K, V>(&self, rules: I) -> Result<Vec<FieldPlan>, ValidatorError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut plans = Vec::new();

        for (field, spec) in rules {
            let field: String = field.into();
            let mut compiled = Vec::new();

            for invocation in parse_rules(spec.as_ref()) {
                match Rule::resolve(&invocation) {
                    Ok(Some(rule)) => compiled.push(CompiledRule { rule, invocation }),
                    Ok(None) if self.config.strict_rules => {
                        return Err(ValidatorError::UnknownRule {
                            field,
                            rule: invocation.name,
                        });
                    }
                    Ok(None) if invocation.name.is_empty() => {
                        debug!(field = %field, "skipping empty rule");
                    }
                    Ok(None) => {
                        warn!(field = %field, rule = %invocation.name, "unknown validation rule ignored");
                    }
                    Err(source) => {
                        return Err(ValidatorError::InvalidParameters {
                            field,
                            rule: RuleKind::from_name(&invocation.name)
                                .map_or("unknown", |kind| kind.name()),
                            source,
                        });
                    }
                }
            }

            plans.push(FieldPlan {
                field,
                rules: compiled,
            });
        }

        Ok(plans)
    }

    async fn run(
        &self,
        plans: &[FieldPlan],
        data: &ValidationInput,
    ) -> Result<ValidationErrors, ValidatorError> {
        let mut errors = ValidationErrors::new();

        for plan in plans {
            let state = self.run_field(plan, data, &mut errors).await?;
            debug!(field = %plan.field, ?state, "field validated");
        }

        Ok(errors)
    }

    async fn run_field(
        &self,
        plan: &FieldPlan,
        data: &ValidationInput,
        errors: &mut ValidationErrors,
    ) -> Result<FieldState, ValidatorError> {
        for compiled in &plan.rules {
            let kind = compiled.rule.kind();
            let outcome = compiled
                .rule
                .evaluate(&plan.field, data, self.checker.as_ref())
                .await
                .map_err(|source| {
                    error!(field = %plan.field, rule = %kind, error = %source, "existence check failed");
                    ValidatorError::Dependency {
                        field: plan.field.clone(),
                        rule: kind.name(),
                        source,
                    }
                })?;

            match outcome {
                RuleOutcome::Nullable(true) => return Ok(FieldState::StoppedByNullable),
                RuleOutcome::Nullable(false) => {}
                RuleOutcome::Checked {
                    error: true,
                    message_key,
                } => {
                    let message =
                        self.catalog
                            .render(message_key, &plan.field, &compiled.invocation.params);
                    debug!(field = %plan.field, rule = %kind, "rule failed");
                    errors.add(ValidationError::new(&plan.field, message, message_key));
                }
                RuleOutcome::Checked { error: false, .. } => {}
            }
        }

        Ok(FieldState::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Locale;
    use crate::existence::InMemoryExistenceChecker;
    use crate::rules::ParameterError;
    use serde_json::json;
    use tracing_test::traced_test;

    fn data(pairs: &[(&str, Value)]) -> ValidationInput {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_required_message_names_field() {
        let mut validator = Validator::without_database();
        validator
            .validate(&data(&[]), [("email", "required")])
            .await
            .unwrap();

        assert!(validator.fails());
        assert_eq!(
            validator.errors().field_messages("email"),
            vec!["The email field is required."]
        );
        assert_eq!(validator.errors().get_field_errors("email").unwrap()[0].code, "required");
    }

    #[tokio::test]
    async fn test_nullable_short_circuits_only_its_field() {
        let mut validator = Validator::without_database();
        validator
            .validate(
                &data(&[("nick", json!(null)), ("name", json!("Al"))]),
                [("nick", "nullable|min:3"), ("name", "nullable|min:3")],
            )
            .await
            .unwrap();

        assert!(!validator.errors().has_field_errors("nick"));
        assert_eq!(
            validator.errors().field_messages("name"),
            vec!["The name field must be at least 3 characters."]
        );
    }

    #[tokio::test]
    async fn test_rules_before_nullable_still_run() {
        let mut validator = Validator::without_database();
        validator
            .validate(&data(&[]), [("bio", "string|required|nullable|min:3")])
            .await
            .unwrap();

        // absent passes `string`, fails `required`, then stops at `nullable`
        assert_eq!(validator.errors().total_errors(), 1);
        assert_eq!(validator.errors().get_field_errors("bio").unwrap()[0].code, "required");
    }

    #[tokio::test]
    async fn test_failures_accumulate_in_rule_order() {
        let mut validator = Validator::without_database();
        validator
            .validate(&data(&[("code", json!(42))]), [("code", "string|min:5")])
            .await
            .unwrap();

        assert_eq!(
            validator.errors().field_messages("code"),
            vec![
                "The code field must be a string.",
                "The code field must be at least 5 characters."
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_rules_append_twice() {
        let mut validator = Validator::without_database();
        validator
            .validate(&data(&[]), [("name", "required|required")])
            .await
            .unwrap();

        assert_eq!(validator.errors().total_errors(), 2);
    }

    #[tokio::test]
    async fn test_max_message_uses_first_param() {
        let mut validator = Validator::without_database();
        validator
            .validate(&data(&[("title", json!("abcdef"))]), [("title", "max:5")])
            .await
            .unwrap();

        assert_eq!(
            validator.errors().first("title"),
            Some("The title field must not be greater than 5 characters.")
        );
    }

    #[tokio::test]
    async fn test_validate_resets_previous_result() {
        let mut validator = Validator::without_database();
        let rules = [("name", "required|min:3")];

        validator.validate(&data(&[]), rules).await.unwrap();
        let first = validator.errors().clone();
        validator.validate(&data(&[]), rules).await.unwrap();
        assert_eq!(validator.errors(), &first);
        assert_eq!(validator.errors().total_errors(), 2);

        validator
            .validate(&data(&[("name", json!("Alice"))]), rules)
            .await
            .unwrap();
        assert!(validator.passes());
    }

    #[tokio::test]
    async fn test_check_leaves_stored_result_alone() {
        let mut validator = Validator::without_database();
        validator.validate(&data(&[]), [("a", "required")]).await.unwrap();

        let errors = validator
            .check(&data(&[("b", json!(1))]), [("b", "string")])
            .await
            .unwrap();

        assert!(errors.has_field_errors("b"));
        assert!(validator.errors().has_field_errors("a"));
        assert!(!validator.errors().has_field_errors("b"));
    }

    #[tokio::test]
    async fn test_fields_follow_rule_order() {
        let mut rules = RuleSpec::new();
        rules.insert("zeta".to_string(), "required".to_string());
        rules.insert("alpha".to_string(), "required".to_string());

        let mut validator = Validator::without_database();
        validator.validate(&data(&[]), &rules).await.unwrap();

        assert_eq!(validator.errors().fields().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_unknown_rules_are_ignored_by_default() {
        let mut validator = Validator::without_database();
        validator
            .validate(&data(&[("name", json!(""))]), [("name", "uuid|required|")])
            .await
            .unwrap();

        assert_eq!(validator.errors().total_errors(), 1);
        assert!(logs_contain("unknown validation rule ignored"));
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_unknown_rules() {
        let mut validator = Validator::without_database().with_config(ValidatorConfig::strict());

        let result = validator
            .validate(&data(&[]), [("name", "required|uuid")])
            .await;

        assert!(matches!(
            result,
            Err(ValidatorError::UnknownRule { ref field, ref rule }) if field == "name" && rule == "uuid"
        ));
        assert!(validator.passes());
    }

    #[tokio::test]
    async fn test_invalid_parameters_abort_before_evaluation() {
        let mut validator = Validator::without_database();
        validator.validate(&data(&[]), [("a", "required")]).await.unwrap();
        assert!(validator.fails());

        let result = validator
            .validate(&data(&[]), [("a", "required"), ("b", "min:abc")])
            .await;

        assert!(matches!(
            result,
            Err(ValidatorError::InvalidParameters { ref field, rule: "min", .. }) if field == "b"
        ));
        assert!(validator.passes());
    }

    #[tokio::test]
    async fn test_unsafe_table_name_is_a_configuration_error() {
        let checker = InMemoryExistenceChecker::new();
        let mut validator = Validator::new(checker);

        let result = validator
            .validate(
                &data(&[("email", json!("a@x.com"))]),
                [("email", "exists:a.b,email")],
            )
            .await;

        assert!(matches!(
            result,
            Err(ValidatorError::InvalidParameters {
                rule: "exists",
                source: ParameterError::Identifier(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_dependency_failure_propagates() {
        let mut validator = Validator::without_database();
        let result = validator
            .validate(
                &data(&[("name", json!("")), ("email", json!("a@x.com"))]),
                [("name", "required"), ("email", "exists:users,email")],
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.is_dependency());
        assert!(matches!(err, ValidatorError::Dependency { ref field, rule: "exists", .. } if field == "email"));
        assert!(validator.passes());
    }

    #[tokio::test]
    async fn test_existence_rules_use_injected_checker() {
        let checker = InMemoryExistenceChecker::new().with("users", "email", json!("a@x.com"));
        let mut validator = Validator::new(checker);

        validator
            .validate(
                &data(&[("email", json!("a@x.com")), ("owner", json!("b@x.com"))]),
                [
                    ("email", "exists:users,email"),
                    ("owner", "not_exists:users,email"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(
            validator.errors().first("email"),
            Some("The email field already exists in the table.")
        );
        assert_eq!(
            validator.errors().first("owner"),
            Some("The owner field does not exist in the table.")
        );
    }

    #[tokio::test]
    async fn test_locale_and_custom_catalog() {
        let mut validator = Validator::without_database()
            .with_config(ValidatorConfig::new().with_locale(Locale::PtBr));
        validator.validate(&data(&[]), [("nome", "required")]).await.unwrap();
        assert_eq!(validator.errors().first("nome"), Some("O campo nome é obrigatório."));

        let catalog = MessageCatalog::english()
            .with_template("required", "missing :input")
            .unwrap();
        let mut validator = Validator::without_database()
            .with_catalog(catalog)
            .with_config(ValidatorConfig::new().with_locale(Locale::PtBr));
        validator.validate(&data(&[]), [("nome", "required")]).await.unwrap();
        assert_eq!(validator.errors().first("nome"), Some("missing nome"));
    }
}

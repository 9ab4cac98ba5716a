//! Prompts bundled with the `cuecard` binary.

use std::sync::Arc;

use anyhow::bail;
use cuecard_registry::{
    BoundArguments, DefinitionFactory, Parameter, PromptDefinition, PromptProvider, PromptRegistry, PromptRegistryBuilder, RegistryError,
};
use cuecard_types::{NormalizedResult, PromptMessage};
use serde::Deserialize;

/// Free-standing prompts, registered as one table.
const PROMPT_TABLE: &[DefinitionFactory] = &[greeting_definitions, summary_definitions];

/// Build the catalog served by the binary.
pub fn build_registry() -> Result<PromptRegistry, RegistryError> {
    let mut builder = PromptRegistryBuilder::new();
    builder
        .register_table(PROMPT_TABLE)?
        .register_all_on(Some(Arc::new(ReviewPrompts::default())))?;
    Ok(builder.build())
}

fn greeting_definitions() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition::builder("greeting")
            .description("A friendly greeting to open a conversation")
            .handler(greeting),
    ]
}

async fn greeting(_arguments: BoundArguments) -> anyhow::Result<Vec<PromptMessage>> {
    Ok(vec![PromptMessage::assistant("Hello! How can I assist you today?")])
}

fn summary_definitions() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition::builder("summary")
            .description("Ask for a summary of a piece of text")
            .result_description("Summarization request")
            .parameter(Parameter::text("text").description("Text to summarize"))
            .parameter(
                Parameter::integer("sentences")
                    .description("Maximum number of sentences")
                    .optional()
                    .default_value(3),
            )
            .handler(summary),
    ]
}

async fn summary(arguments: BoundArguments) -> anyhow::Result<Vec<PromptMessage>> {
    let text: String = arguments.get("text")?;
    let sentences: i64 = arguments.get("sentences")?;
    if sentences < 1 {
        bail!("sentences must be at least 1, got {sentences}");
    }
    Ok(vec![PromptMessage::user(format!(
        "Summarize the following text in at most {sentences} sentences:\n\n{text}"
    ))])
}

/// Areas a code review can concentrate on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFocus {
    Correctness,
    Performance,
    Security,
    Style,
}

/// Instance-bound review prompts sharing a set of house guidelines.
#[derive(Debug)]
pub struct ReviewPrompts {
    guidelines: Vec<String>,
}

impl Default for ReviewPrompts {
    fn default() -> Self {
        Self {
            guidelines: vec![
                "Point out bugs before style issues.".to_string(),
                "Suggest concrete changes, not general advice.".to_string(),
            ],
        }
    }
}

impl ReviewPrompts {
    async fn code_review(self: Arc<Self>, arguments: BoundArguments) -> anyhow::Result<NormalizedResult> {
        if arguments.cancellation().is_some_and(|token| token.is_cancelled()) {
            bail!("review request was cancelled");
        }

        let code: String = arguments.get("code")?;
        let language: Option<String> = arguments.get("language")?;
        let focus: Option<Vec<ReviewFocus>> = arguments.get("focus")?;

        let mut instructions = String::from("You are reviewing code. Follow these guidelines:\n");
        for guideline in &self.guidelines {
            instructions.push_str("- ");
            instructions.push_str(guideline);
            instructions.push('\n');
        }
        if let Some(focus) = focus.filter(|focus| !focus.is_empty()) {
            let areas = focus.iter().map(|area| format!("{area:?}").to_lowercase()).collect::<Vec<_>>();
            instructions.push_str(&format!("Concentrate on: {}.\n", areas.join(", ")));
        }

        let fence = language.as_deref().unwrap_or_default();
        let description = match &language {
            Some(language) => format!("Code review of a {language} snippet"),
            None => "Code review".to_string(),
        };

        Ok(NormalizedResult::new(vec![
            PromptMessage::assistant(instructions),
            PromptMessage::user(format!("Please review this code:\n\n```{fence}\n{code}\n```")),
        ])
        .with_description(description))
    }
}

impl PromptProvider for ReviewPrompts {
    fn prompt_definitions() -> Vec<PromptDefinition> {
        vec![
            PromptDefinition::builder("code_review")
                .description("Review a code snippet against the house guidelines")
                .parameter(Parameter::text("code").description("Source code to review"))
                .parameter(Parameter::text("language").description("Language of the snippet").optional())
                .parameter(
                    Parameter::structured::<Vec<ReviewFocus>>("focus")
                        .description("JSON list of focus areas: correctness, performance, security, style")
                        .optional(),
                )
                .parameter(Parameter::cancellation("cancellation"))
                .method(ReviewPrompts::code_review),
        ]
    }
}

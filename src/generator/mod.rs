//! Component generation stub.
//!
//! Picks one of three fixed templates by keyword matching on the prompt. There
//! is no model behind this and no randomness: the same prompt always yields
//! the same code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BRAND_BUTTON: &str = include_str!("templates/brand_button.tsx");
const COUNTER: &str = include_str!("templates/counter.tsx");
const TOGGLE: &str = include_str!("templates/toggle.tsx");
const COMPONENT_TYPES: &str = include_str!("templates/component_types.ts");

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Prompt is required for component generation")]
    EmptyPrompt,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Nextjs,
    React,
    Vue,
    Svelte,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Styling {
    #[default]
    Tailwind,
    Css,
    StyledComponents,
}

/// Caller preferences. Echoed back with the result; they never change which
/// template is chosen.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerateOptions {
    pub framework: Framework,
    pub styling: Styling,
    pub typescript: bool,
    /// Free-form feature tags carried through to synced components.
    pub features: Vec<String>,
}

/// The fixed templates, in match priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    BrandButton,
    Counter,
    Toggle,
}

impl Template {
    /// Lowercase keyword match: the brand button needs both "button" and
    /// "joinecogrow", then "counter", else the generic toggle.
    pub fn select(prompt: &str) -> Self {
        let prompt = prompt.to_lowercase();
        if prompt.contains("button") && prompt.contains("joinecogrow") {
            Self::BrandButton
        } else if prompt.contains("counter") {
            Self::Counter
        } else {
            Self::Toggle
        }
    }

    pub fn component_name(&self) -> &'static str {
        match self {
            Self::BrandButton => "JoinEcoGrowButton",
            Self::Counter => "CounterComponent",
            Self::Toggle => "GeneratedComponent",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::BrandButton => BRAND_BUTTON,
            Self::Counter => COUNTER,
            Self::Toggle => TOGGLE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedCode {
    pub name: String,
    pub code: String,
    pub success: bool,
    pub template: Template,
    pub options: GenerateOptions,
}

pub fn generate(prompt: &str, options: &GenerateOptions) -> Result<GeneratedCode, GenerationError> {
    if prompt.is_empty() {
        return Err(GenerationError::EmptyPrompt);
    }

    let template = Template::select(prompt);
    tracing::debug!(?template, "Selected component template");

    Ok(GeneratedCode {
        name: template.component_name().to_string(),
        code: template.source().to_string(),
        success: true,
        template,
        options: options.clone(),
    })
}

/// TypeScript props/state/ref stubs for a generated component.
pub fn component_types(name: &str) -> String {
    COMPONENT_TYPES.replace("__NAME__", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_button_needs_both_keywords() {
        assert_eq!(
            Template::select("A JoinEcoGrow BUTTON for signups"),
            Template::BrandButton
        );
        assert_eq!(Template::select("a plain button"), Template::Toggle);
    }

    #[test]
    fn brand_button_wins_over_counter() {
        assert_eq!(
            Template::select("joinecogrow button with a counter"),
            Template::BrandButton
        );
    }

    #[test]
    fn counter_keyword_selects_counter() {
        let generated = generate("Build a Counter widget", &GenerateOptions::default()).unwrap();
        assert_eq!(generated.name, "CounterComponent");
        assert!(generated.code.contains("useState(0)"));
        assert!(generated.success);
    }

    #[test]
    fn falls_back_to_toggle() {
        let generated =
            generate("Create a tree planting tracker", &GenerateOptions::default()).unwrap();
        assert_eq!(generated.template, Template::Toggle);
        assert!(generated.code.contains("export default function GeneratedComponent"));
    }

    #[test]
    fn generation_is_deterministic() {
        let options = GenerateOptions::default();
        assert_eq!(
            generate("counter", &options).unwrap(),
            generate("counter", &options).unwrap()
        );
    }

    #[test]
    fn empty_prompt_is_rejected() {
        assert_eq!(
            generate("", &GenerateOptions::default()),
            Err(GenerationError::EmptyPrompt)
        );
    }

    #[test]
    fn whitespace_prompt_falls_back_to_toggle() {
        let generated = generate("  \n", &GenerateOptions::default()).unwrap();
        assert_eq!(generated.template, Template::Toggle);
    }

    #[test]
    fn options_deserialize_from_request_json() {
        let options: GenerateOptions =
            serde_json::from_str(r#"{"framework":"vue","styling":"styled-components"}"#).unwrap();
        assert_eq!(options.framework, Framework::Vue);
        assert_eq!(options.styling, Styling::StyledComponents);
        assert!(!options.typescript);
    }

    #[test]
    fn component_types_are_named_after_component() {
        let types = component_types("CounterComponent");
        assert!(types.contains("export interface CounterComponentProps"));
        assert!(!types.contains("__NAME__"));
    }
}

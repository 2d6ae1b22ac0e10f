//! Token pricing and cost estimation.

use crate::config::AiProvider;

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (f64::from(input_tokens) * self.input_per_million
            + f64::from(output_tokens) * self.output_per_million)
            / 1_000_000.0
    }
}

/// Model name prefixes and their prices. The first matching prefix wins, so
/// more specific names come first.
const OPENAI_PRICING: &[(&str, ModelPricing)] = &[
    ("gpt-4o-mini", ModelPricing { input_per_million: 0.15, output_per_million: 0.60 }),
    ("gpt-4o", ModelPricing { input_per_million: 2.50, output_per_million: 10.00 }),
    ("gpt-4.1-nano", ModelPricing { input_per_million: 0.10, output_per_million: 0.40 }),
    ("gpt-4.1-mini", ModelPricing { input_per_million: 0.40, output_per_million: 1.60 }),
    ("gpt-4.1", ModelPricing { input_per_million: 2.00, output_per_million: 8.00 }),
    ("gpt-4-turbo", ModelPricing { input_per_million: 10.00, output_per_million: 30.00 }),
    ("gpt-4", ModelPricing { input_per_million: 30.00, output_per_million: 60.00 }),
    ("gpt-3.5-turbo", ModelPricing { input_per_million: 0.50, output_per_million: 1.50 }),
];

const ANTHROPIC_PRICING: &[(&str, ModelPricing)] = &[
    ("claude-3-5-haiku", ModelPricing { input_per_million: 0.80, output_per_million: 4.00 }),
    ("claude-3-haiku", ModelPricing { input_per_million: 0.25, output_per_million: 1.25 }),
    ("claude-3-opus", ModelPricing { input_per_million: 15.00, output_per_million: 75.00 }),
    ("claude-3-5-sonnet", ModelPricing { input_per_million: 3.00, output_per_million: 15.00 }),
    ("claude-3-7-sonnet", ModelPricing { input_per_million: 3.00, output_per_million: 15.00 }),
    ("claude-sonnet-4", ModelPricing { input_per_million: 3.00, output_per_million: 15.00 }),
    ("claude-opus-4", ModelPricing { input_per_million: 15.00, output_per_million: 75.00 }),
];

/// Prices for unknown models of each provider: the most expensive listed
/// tier, so the cost gate errs towards refusing.
const OPENAI_FALLBACK: ModelPricing = ModelPricing { input_per_million: 30.00, output_per_million: 60.00 };
const ANTHROPIC_FALLBACK: ModelPricing = ModelPricing { input_per_million: 15.00, output_per_million: 75.00 };

/// Approximate characters per token for English prompts.
const CHARS_PER_TOKEN: usize = 4;

pub fn pricing_for(provider: AiProvider, model: &str) -> ModelPricing {
    let model = model.to_lowercase();
    let (table, fallback) = match provider {
        AiProvider::OpenAi => (OPENAI_PRICING, OPENAI_FALLBACK),
        AiProvider::Anthropic => (ANTHROPIC_PRICING, ANTHROPIC_FALLBACK),
    };
    table
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, pricing)| *pricing)
        .unwrap_or(fallback)
}

/// Rough token count of a prompt.
pub fn estimate_tokens(text: &str) -> u32 {
    let tokens = text.chars().count().div_ceil(CHARS_PER_TOKEN);
    u32::try_from(tokens).unwrap_or(u32::MAX)
}

/// Worst-case cost of a call: the estimated prompt plus the full output budget.
pub fn estimate_cost(provider: AiProvider, model: &str, prompt: &str, max_output_tokens: u32) -> f64 {
    pricing_for(provider, model).cost(estimate_tokens(prompt), max_output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_lookup_prefers_specific_model() {
        let mini = pricing_for(AiProvider::OpenAi, "gpt-4o-mini-2024-07-18");
        assert_eq!(mini.input_per_million, 0.15);
        let full = pricing_for(AiProvider::OpenAi, "GPT-4o");
        assert_eq!(full.input_per_million, 2.50);
    }

    #[test]
    fn test_unknown_model_uses_expensive_fallback() {
        assert_eq!(pricing_for(AiProvider::OpenAi, "mystery"), OPENAI_FALLBACK);
        assert_eq!(
            pricing_for(AiProvider::Anthropic, "claude-next"),
            ANTHROPIC_FALLBACK
        );
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_estimate_cost() {
        // 4000 chars -> 1000 input tokens, plus 1000 output tokens
        let prompt = "x".repeat(4000);
        let cost = estimate_cost(AiProvider::OpenAi, "gpt-4o-mini", &prompt, 1000);
        assert!((cost - (0.15 + 0.60) / 1000.0).abs() < 1e-12);
    }
}

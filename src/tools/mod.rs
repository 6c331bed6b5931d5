//! Deterministic tools the agent can declare to the language model.
//!
//! - Calculator: safe arithmetic expression evaluation
//! - Date: day offsets from today
//! - Text: word/character counts and keyword sentiment
//! - Weather: live lookup with a clothing recommendation

pub mod calculator;
pub mod date;
pub mod text;
pub mod weather;

pub use calculator::{evaluate, MathCalculatorTool};
pub use date::{date_after, offset_date, DateUtilityTool};
pub use text::{analyze, Sentiment, TextAnalyzerTool, TextStats};
pub use weather::{clothing_recommendation, WeatherClient, WeatherReport, WeatherTool};

use crate::tool::ToolRegistry;

/// The three self-contained tools. The weather tool needs a configured
/// [`WeatherClient`] and is registered separately.
pub fn core_toolkit() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(MathCalculatorTool);
    registry.register(DateUtilityTool);
    registry.register(TextAnalyzerTool);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_toolkit_registers_the_deterministic_tools() {
        let registry = core_toolkit();
        assert!(registry.get("math_calculator").is_some());
        assert!(registry.get("date_utility").is_some());
        assert!(registry.get("text_analyzer").is_some());
        assert!(registry.get("weather_tool").is_none());
    }
}

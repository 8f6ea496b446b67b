//! Intent Classifier
//!
//! Ordered keyword/pattern rules over normalized text. Rules overlap, so
//! the first match wins and the order below is the tie-break policy.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// What the user is asking for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Price,
    Trending,
    Chart,
    PortfolioUpdate,
    PortfolioValue,
    /// Nothing matched; answer with usage help
    Help,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Price,
        Intent::Trending,
        Intent::Chart,
        Intent::PortfolioUpdate,
        Intent::PortfolioValue,
        Intent::Help,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Price => "price",
            Intent::Trending => "trending",
            Intent::Chart => "chart",
            Intent::PortfolioUpdate => "portfolio_update",
            Intent::PortfolioValue => "portfolio_value",
            Intent::Help => "help",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Rule {
    intent: Intent,
    phrases: &'static [&'static str],
    pattern: Option<Regex>,
}

impl Rule {
    fn new(intent: Intent, phrases: &'static [&'static str], pattern: Option<&str>) -> Self {
        Self {
            intent,
            phrases,
            pattern: pattern.map(|p| Regex::new(p).expect("intent pattern must compile")),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.phrases.iter().any(|phrase| text.contains(phrase))
            || self.pattern.as_ref().is_some_and(|re| re.is_match(text))
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            Intent::Price,
            &["price", "trading at"],
            Some(r"how much is|what's the price of|what is the price of|how much does .* cost"),
        ),
        Rule::new(Intent::Trending, &["trending", "popular coins", "top coins"], None),
        Rule::new(Intent::Chart, &["chart", "graph", "price history"], None),
        Rule::new(
            Intent::PortfolioUpdate,
            &["i have", "my portfolio"],
            Some(r"add|bought|purchased|own|holding"),
        ),
        Rule::new(
            Intent::PortfolioValue,
            &["portfolio value", "my holdings", "what am i holding"],
            None,
        ),
    ]
});

/// Lower-cased, trimmed copy of user input.
///
/// Typographic apostrophes are folded to ASCII so "what’s" matches "what's".
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace('\u{2019}', "'")
}

/// Classify raw user input
pub fn classify(text: &str) -> Intent {
    classify_normalized(&normalize(text))
}

/// Classify text that has already been through `normalize`
pub fn classify_normalized(text: &str) -> Intent {
    RULES
        .iter()
        .find(|rule| rule.matches(text))
        .map_or(Intent::Help, |rule| rule.intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_phrasings() {
        assert_eq!(classify("What's the price of Bitcoin?"), Intent::Price);
        assert_eq!(classify("ETH trading at?"), Intent::Price);
        assert_eq!(classify("how much is solana"), Intent::Price);
        assert_eq!(classify("How much does one doge cost"), Intent::Price);
        assert_eq!(classify("what\u{2019}s the price of ada"), Intent::Price);
    }

    #[test]
    fn test_other_rule_groups() {
        assert_eq!(classify("show me trending coins"), Intent::Trending);
        assert_eq!(classify("top coins today"), Intent::Trending);
        assert_eq!(classify("eth chart"), Intent::Chart);
        assert_eq!(classify("graph of solana"), Intent::Chart);
        assert_eq!(classify("I have 2 ETH"), Intent::PortfolioUpdate);
        assert_eq!(classify("bought 3 doge"), Intent::PortfolioUpdate);
        assert_eq!(classify("portfolio value"), Intent::PortfolioValue);
    }

    #[test]
    fn test_first_rule_wins() {
        // "price history" is also a chart phrase, but price is checked first
        assert_eq!(classify("bitcoin price history"), Intent::Price);
        // "what am i holding" contains "holding"
        assert_eq!(classify("what am i holding"), Intent::PortfolioUpdate);
        assert_eq!(classify("trending chart"), Intent::Trending);
    }

    #[test]
    fn test_fallback() {
        assert_eq!(classify("hello there"), Intent::Help);
        assert_eq!(classify("   "), Intent::Help);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  I Have 2 ETH \n"), "i have 2 eth");
    }
}

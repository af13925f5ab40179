//! Fuzzy matching against a registry built from configuration.

use std::collections::HashMap;

use chatbridge_core::{
    normalize, CommandRegistry, CommandSource, FuzzyMatcher, Language, MatchTier,
};

fn registry() -> CommandRegistry {
    let messages: HashMap<String, String> = [("TimeoutVN", "Hết giờ"), ("TimeoutEN", "Timeout")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let mut builder = CommandRegistry::builder(messages);
    builder
        .register(
            Language::Vietnamese,
            &[
                CommandSource::new("bật đèn", "LED_ON"),
                CommandSource::new("tắt đèn", "LED_OFF"),
                CommandSource::new("độ ẩm", "HUMP").with_response("Data", "Độ ẩm: "),
            ],
        )
        .unwrap();
    builder
        .register(
            Language::English,
            &[
                CommandSource::new("light on", "LED_ON"),
                CommandSource::new("light off", "LED_OFF"),
                CommandSource::new("humidity", "HUMP").with_response("Data", "Humidity: "),
            ],
        )
        .unwrap();
    builder.build()
}

#[test]
fn test_unaccented_input_matches_exactly() {
    let registry = registry();
    let matcher = FuzzyMatcher::new(70.0);

    let result = matcher.match_command("Bat Den", registry.chat_commands());
    assert_eq!(result.tier, MatchTier::Exact);
    assert_eq!(result.candidate, "bật đèn");
    assert_eq!(registry.language_of(&result.candidate), Some(Language::Vietnamese));
}

#[test]
fn test_typo_is_close() {
    let registry = registry();
    let matcher = FuzzyMatcher::new(70.0);

    let result = matcher.match_command("humidty", registry.chat_commands());
    assert_eq!(result.tier, MatchTier::Close);
    assert_eq!(result.candidate, "humidity");
    assert!(result.similarity >= 70.0 && result.similarity < 100.0);
}

#[test]
fn test_gibberish_is_no_match() {
    let registry = registry();
    let matcher = FuzzyMatcher::new(70.0);

    let result = matcher.match_command("what is the weather", registry.chat_commands());
    assert_eq!(result.tier, MatchTier::NoMatch);
    assert_eq!(result.ranked.len(), registry.len());
}

#[test]
fn test_ranking_is_descending() {
    let registry = registry();
    let matcher = FuzzyMatcher::new(70.0);

    let result = matcher.match_command("tat den", registry.chat_commands());
    assert_eq!(result.candidate, "tắt đèn");
    for pair in result.ranked.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[test]
fn test_normalize_equivalence() {
    assert_eq!(normalize("Đèn"), normalize("den"));
    assert_eq!(normalize("ĐỘ ẨM"), normalize("do am"));
}

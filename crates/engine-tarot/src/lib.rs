//! Tarot Divination Engine
//!
//! Question-seeded readings over the Rider-Waite deck. The deck (22 major
//! arcana, 4 suits × 14 ranks, three spreads) is loaded from
//! `data/rider_waite.json` and shape-asserted at first use. Draws are
//! deterministic for a given question and spread: the question seeds a
//! SplitMix64 stream that shuffles the deck and sets orientations, so the
//! same question always receives the same reading.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DECK_JSON: &str = include_str!("../data/rider_waite.json");

// ---------------------------------------------------------------------------
// Deck data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct MajorCard {
    number: u8,
    name: String,
    keywords: Vec<String>,
    upright: String,
    reversed: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Suit {
    element: String,
    theme: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Rank {
    name: String,
    meaning: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Spread {
    name: String,
    positions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DeckData {
    major_arcana: Vec<MajorCard>,
    suits: BTreeMap<String, Suit>,
    ranks: Vec<Rank>,
    spreads: BTreeMap<String, Spread>,
}

fn deck_data() -> &'static DeckData {
    static DECK: OnceLock<DeckData> = OnceLock::new();
    DECK.get_or_init(|| {
        let deck: DeckData =
            serde_json::from_str(DECK_JSON).expect("rider_waite.json is malformed");
        assert_eq!(deck.major_arcana.len(), 22, "22 major arcana required");
        assert_eq!(deck.suits.len(), 4, "4 suits required");
        assert_eq!(deck.ranks.len(), 14, "14 ranks per suit required");
        for key in ["single_card", "three_card", "celtic_cross"] {
            assert!(deck.spreads.contains_key(key), "spread '{}' missing", key);
        }
        deck
    })
}

/// One card as drawn into a reading.
#[derive(Debug, Clone, Serialize)]
pub struct DrawnCard {
    pub position: String,
    pub name: String,
    pub arcana: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    pub reversed: bool,
    pub meaning: String,
    pub keywords: Vec<String>,
}

// ---------------------------------------------------------------------------
// Deterministic shuffle
// ---------------------------------------------------------------------------

/// FNV-1a over the seeding text.
fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// SplitMix64: small, well-distributed, reproducible.
struct SplitMix64(u64);

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

enum DeckCard {
    Major(usize),
    Minor { suit: String, rank: usize },
}

fn full_deck() -> Vec<DeckCard> {
    let data = deck_data();
    let mut deck: Vec<DeckCard> = (0..data.major_arcana.len()).map(DeckCard::Major).collect();
    for suit in data.suits.keys() {
        for rank in 0..data.ranks.len() {
            deck.push(DeckCard::Minor { suit: suit.clone(), rank });
        }
    }
    deck
}

fn draw(question: &str, spread_key: &str) -> Vec<DrawnCard> {
    let data = deck_data();
    let spread = &data.spreads[spread_key];

    let mut rng = SplitMix64(fnv1a(&format!("{}|{}", question.trim().to_lowercase(), spread_key)));
    let mut deck = full_deck();

    // Fisher-Yates.
    for i in (1..deck.len()).rev() {
        let j = rng.below(i + 1);
        deck.swap(i, j);
    }

    spread
        .positions
        .iter()
        .zip(deck.into_iter())
        .map(|(position, card)| {
            let reversed = rng.next() % 2 == 1;
            match card {
                DeckCard::Major(idx) => {
                    let major = &data.major_arcana[idx];
                    DrawnCard {
                        position: position.clone(),
                        name: major.name.clone(),
                        arcana: "major",
                        suit: None,
                        element: None,
                        reversed,
                        meaning: if reversed {
                            major.reversed.clone()
                        } else {
                            major.upright.clone()
                        },
                        keywords: major.keywords.clone(),
                    }
                }
                DeckCard::Minor { suit, rank } => {
                    let suit_data = &data.suits[&suit];
                    let rank_data = &data.ranks[rank];
                    let orientation = if reversed { "blocked or inverted: " } else { "" };
                    DrawnCard {
                        position: position.clone(),
                        name: format!("{} of {}", rank_data.name, capitalise(&suit)),
                        arcana: "minor",
                        element: Some(suit_data.element.clone()),
                        reversed,
                        meaning: format!(
                            "{}{} in the realm of {}",
                            orientation, rank_data.meaning, suit_data.theme
                        ),
                        keywords: vec![suit_data.element.clone(), rank_data.name.to_lowercase()],
                        suit: Some(suit),
                    }
                }
            }
        })
        .collect()
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct TarotEngine;

impl TarotEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TarotEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for TarotEngine {
    fn name(&self) -> &'static str {
        "tarot"
    }

    fn description(&self) -> &'static str {
        "Tarot sequence decoder — traditional spreads with archetypal and elemental analysis"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("question", FieldKind::String, "The question held while drawing"),
            FieldSpec::optional("spread_type", FieldKind::String, "Spread layout")
                .one_of(&["single_card", "three_card", "celtic_cross"]),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("cards", FieldKind::Array, "Drawn cards with positions"),
            FieldSpec::required("spread", FieldKind::Object, "Spread layout used"),
            FieldSpec::required("elemental_balance", FieldKind::Object, "Element counts"),
            FieldSpec::required("overall_guidance", FieldKind::String, "Reading summary"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        #[derive(Deserialize)]
        struct TarotInput {
            question: String,
            #[serde(default = "default_spread")]
            spread_type: String,
        }
        fn default_spread() -> String {
            "three_card".into()
        }

        let parsed: TarotInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        if parsed.question.trim().is_empty() {
            return Err(EngineError::invalid_input("question", "must not be empty"));
        }
        let spread = deck_data().spreads.get(&parsed.spread_type).ok_or_else(|| {
            EngineError::invalid_input(
                "spread_type",
                format!("unknown spread '{}'", parsed.spread_type),
            )
        })?;

        let cards = draw(&parsed.question, &parsed.spread_type);

        let mut balance: BTreeMap<String, u32> =
            ["fire", "water", "air", "earth", "spirit"]
                .into_iter()
                .map(|e| (e.to_string(), 0))
                .collect();
        for card in &cards {
            let element = card.element.as_deref().unwrap_or("spirit");
            *balance.entry(element.to_string()).or_insert(0) += 1;
        }

        let reversed_count = cards.iter().filter(|c| c.reversed).count();
        let overall_guidance = if reversed_count * 2 > cards.len() {
            "The reading leans inward: most energies are blocked or inverted, pointing to internal work before outer action"
        } else {
            "The reading leans outward: energies flow upright, favouring direct engagement with the question"
        };

        Ok(json!({
            "question": parsed.question,
            "spread": { "key": parsed.spread_type, "name": spread.name, "positions": spread.positions },
            "cards": cards,
            "card_count": cards.len(),
            "reversed_count": reversed_count,
            "elemental_balance": balance,
            "overall_guidance": overall_guidance,
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let mut text = format!(
            "🃏 TAROT SEQUENCE DECODING - {} 🃏\n\n❓ {}\n\n",
            raw["spread"]["name"].as_str().unwrap_or(""),
            raw["question"].as_str().unwrap_or(""),
        );
        if let Some(cards) = raw["cards"].as_array() {
            for card in cards {
                text.push_str(&format!(
                    "▸ {}: {}{}\n   {}\n",
                    card["position"].as_str().unwrap_or(""),
                    card["name"].as_str().unwrap_or(""),
                    if card["reversed"].as_bool().unwrap_or(false) { " (reversed)" } else { "" },
                    card["meaning"].as_str().unwrap_or(""),
                ));
            }
        }
        text.push_str(&format!("\n🌊 {}\n", raw["overall_guidance"].as_str().unwrap_or("")));
        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut recs = vec!["Sit with each card before acting on the reading".to_string()];
        if raw["reversed_count"].as_u64().unwrap_or(0) > 0 {
            recs.push("Reversed cards mark energies turned inward; journal on what resists expression".into());
        }
        recs
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        raw["cards"]
            .as_array()
            .map(|cards| {
                cards
                    .iter()
                    .filter(|c| c["arcana"] == "major")
                    .filter_map(|c| c["name"].as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::RequestEnvelope;
    use serde_json::Map;

    fn input(payload: Value) -> ValidatedInput {
        let map: Map<String, Value> = match payload {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        ValidatedInput::new(RequestEnvelope::default(), map)
    }

    #[test]
    fn deck_has_78_cards() {
        assert_eq!(full_deck().len(), 78);
    }

    #[test]
    fn spreads_draw_correct_counts() {
        assert_eq!(draw("test", "single_card").len(), 1);
        assert_eq!(draw("test", "three_card").len(), 3);
        assert_eq!(draw("test", "celtic_cross").len(), 10);
    }

    #[test]
    fn same_question_same_reading() {
        let a = draw("Will the project succeed?", "three_card");
        let b = draw("Will the project succeed?", "three_card");
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.reversed, y.reversed);
        }
    }

    #[test]
    fn different_questions_usually_differ() {
        let a = draw("Will the project succeed?", "celtic_cross");
        let b = draw("Should I move abroad?", "celtic_cross");
        let same = a.iter().zip(b.iter()).filter(|(x, y)| x.name == y.name).count();
        assert!(same < a.len(), "two distinct questions drew identical spreads");
    }

    #[test]
    fn drawn_cards_are_unique_within_spread() {
        let cards = draw("uniqueness", "celtic_cross");
        let mut names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), cards.len());
    }

    #[test]
    fn engine_output_contract() {
        let engine = TarotEngine::new();
        let raw = engine
            .calculate(&input(json!({
                "question": "What should I focus on this season?",
                "spread_type": "three_card"
            })))
            .unwrap();
        assert_eq!(raw["card_count"], 3);
        assert_eq!(raw["spread"]["positions"].as_array().unwrap().len(), 3);
        assert!(raw["elemental_balance"].is_object());
        assert!(raw["overall_guidance"].is_string());
    }

    #[test]
    fn rejects_empty_question() {
        let engine = TarotEngine::new();
        let err = engine
            .calculate(&input(json!({ "question": "   " })))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn interpret_lists_positions() {
        let engine = TarotEngine::new();
        let inp = input(json!({ "question": "What is emerging?" }));
        let raw = engine.calculate(&inp).unwrap();
        let text = engine.interpret(&raw, &inp);
        let text = text.as_text().unwrap();
        assert!(text.contains("Past"));
        assert!(text.contains("Future"));
    }
}

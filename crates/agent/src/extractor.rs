//! Parameter extraction: rule-based capability and normalizing adapter.
//!
//! `RuleBasedExtractor` is the deterministic default capability: regex
//! extraction of raw value strings from the utterance, per action schema.
//! `ExtractorAdapter` wraps any `Extractor` capability with the stage
//! policy and canonicalizes every raw value through the normalizer; keys
//! outside the action's schema and values the normalizer rejects are
//! dropped, never guessed.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use tracing::debug;

use porcher_core::{
    normalize_amount, normalize_code, normalize_count, normalize_weight, ActionKind,
    CapabilityError, ParamType, ParamValue, ParameterSet,
};

use crate::capabilities::{Extraction, Extractor, StagePolicy};

fn cached(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hard-coded pattern compiles"))
}

fn count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(\d+) ?(?:porcs?|porcelets?|tetes?|sujets?)\b")
}

fn weight_unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(\d+(?:[.,]\d+)?) ?(?:kg|kilogrammes?|kilos?)\b")
}

fn weight_ctx_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(?:fait|pese|poids(?: de)?) (\d+(?:[.,]\d+)?)\b")
}

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(?:porc ?|animal |code )?(p ?\d+)\b|\bporc ?(\d{2,})\b")
}

fn amount_preposition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(?:a|pour|de|montant|prix|cout|paye) (\d[\d .,]*(?:k\b|millions?\b|balles?\b)?)")
}

fn amount_currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(\d[\d .,]*(?: ?(?:k|millions?|balles?))?) ?(?:fcfa|cfa|francs?)\b")
}

fn amount_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(\d[\d .,]* ?(?:k|millions?|balles?))\b")
}

fn amount_plain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b\d{3,}(?: \d{3})*\b")
}

fn unit_after_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^ ?(?:porcs?|porcelets?|tetes?|sujets?|sacs?|kg|kilogrammes?|kilos?)\b")
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?)\b")
}

fn libelle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(
        &RE,
        r"\b(abonnement [a-z]{2,}|loyer|assurance|salaires?|gardiennage|internet|eau|electricite|securite)\b",
    )
}

/// Like `fold_text` but keeps `.`/`,` (decimals, thousands groups) and
/// `/`/`-` (dates), which extraction patterns need.
fn prepare(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        match ch {
            'à' | 'â' | 'ä' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' => out.push('i'),
            'ô' | 'ö' => out.push('o'),
            'ù' | 'û' | 'ü' => out.push('u'),
            'ç' => out.push('c'),
            'œ' => out.push_str("oe"),
            '.' | ',' | '/' | '-' => out.push(ch),
            _ if ch.is_ascii_alphanumeric() => out.push(ch),
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

const BUYER_BLACKLIST: [&str; 14] = [
    "le", "la", "les", "un", "une", "des", "de", "du", "mon", "ma", "mes", "aujourd", "hui",
    "porcs",
];

// Query keywords and articles stripped from a search phrase; the codes and
// names being searched for survive.
const SEARCH_NOISE: [&str; 24] = [
    "chercher", "cherche", "cherches", "trouver", "trouve", "recherche", "rechercher",
    "localiser", "localise", "montre", "moi", "affiche", "afficher", "ou", "est", "sont", "se",
    "quelle", "un", "une", "le", "la", "les", "animal",
];

/// Deterministic extraction capability: regex value spotting per action.
/// Returns raw strings; canonicalization happens in the adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleBasedExtractor;

#[async_trait]
impl Extractor for RuleBasedExtractor {
    async fn extract(
        &self,
        text: &str,
        action: ActionKind,
    ) -> Result<Extraction, CapabilityError> {
        let prepared = prepare(text);
        let mut parameters: BTreeMap<String, String> = BTreeMap::new();

        match action {
            ActionKind::CreateRevenu => {
                insert_capture(&mut parameters, "nombre", count_re().captures(&prepared));
                if let Some(montant) = extract_amount(&prepared) {
                    parameters.insert("montant".to_string(), montant);
                }
                if let Some(acheteur) = extract_buyer(&prepared) {
                    parameters.insert("acheteur".to_string(), acheteur);
                }
                insert_weight(&mut parameters, &prepared);
                insert_date(&mut parameters, &prepared);
            }
            ActionKind::CreateDepense => {
                if let Some(montant) = extract_amount(&prepared) {
                    parameters.insert("montant".to_string(), montant);
                }
                if let Some(categorie) = extract_category(&prepared) {
                    parameters.insert("categorie".to_string(), categorie.to_string());
                }
                insert_date(&mut parameters, &prepared);
            }
            ActionKind::CreateChargeFixe => {
                if let Some(montant) = extract_amount(&prepared) {
                    parameters.insert("montant".to_string(), montant);
                }
                if let Some(captures) = libelle_re().captures(&prepared) {
                    parameters.insert("libelle".to_string(), captures[1].to_string());
                }
                if let Some(frequence) = extract_frequency(&prepared) {
                    parameters.insert("frequence".to_string(), frequence.to_string());
                }
            }
            ActionKind::CreatePesee => {
                if let Some(code) = extract_code(&prepared) {
                    parameters.insert("animal_code".to_string(), code);
                }
                insert_weight(&mut parameters, &prepared);
                insert_date(&mut parameters, &prepared);
            }
            ActionKind::SearchAnimal => {
                let term = extract_search_term(&prepared);
                if !term.is_empty() {
                    parameters.insert("recherche".to_string(), term);
                }
            }
            _ => {}
        }

        let confidence = score(action, &parameters);
        Ok(Extraction { parameters, confidence })
    }
}

fn insert_capture(
    parameters: &mut BTreeMap<String, String>,
    name: &str,
    captures: Option<regex::Captures<'_>>,
) {
    if let Some(captures) = captures {
        parameters.insert(name.to_string(), captures[1].to_string());
    }
}

fn insert_weight(parameters: &mut BTreeMap<String, String>, prepared: &str) {
    let raw = weight_unit_re()
        .captures(prepared)
        .or_else(|| weight_ctx_re().captures(prepared))
        .map(|captures| format!("{} kg", &captures[1]));
    if let Some(raw) = raw {
        parameters.insert("poids_kg".to_string(), raw);
    }
}

fn insert_date(parameters: &mut BTreeMap<String, String>, prepared: &str) {
    if let Some(captures) = date_re().captures(prepared) {
        parameters.insert("date".to_string(), captures[1].to_string());
    } else if prepared.contains("aujourd hui") {
        parameters.insert("date".to_string(), "aujourd hui".to_string());
    }
}

/// Amount spotting in priority order: after a preposition, next to a
/// currency token, with a multiplier suffix, then the largest free-standing
/// number. A candidate followed by a quantity/weight unit or too small to
/// be a price is rejected rather than guessed.
fn extract_amount(prepared: &str) -> Option<String> {
    for captures in amount_preposition_re().captures_iter(prepared) {
        if let Some(raw) = accept_amount(prepared, captures.get(1)) {
            return Some(raw);
        }
    }
    for captures in amount_currency_re().captures_iter(prepared) {
        if let Some(raw) = accept_amount(prepared, captures.get(1)) {
            return Some(raw);
        }
    }
    for captures in amount_suffix_re().captures_iter(prepared) {
        if let Some(raw) = accept_amount(prepared, captures.get(1)) {
            return Some(raw);
        }
    }

    let mut best: Option<(i64, String)> = None;
    for found in amount_plain_re().find_iter(prepared) {
        if unit_after_re().is_match(&prepared[found.end()..]) {
            continue;
        }
        if let Ok(value) = normalize_amount(found.as_str()) {
            if value > 100
                && value <= 100_000_000
                && best.as_ref().map(|(current, _)| value > *current).unwrap_or(true)
            {
                best = Some((value, found.as_str().to_string()));
            }
        }
    }
    best.map(|(_, raw)| raw)
}

fn accept_amount(prepared: &str, capture: Option<regex::Match<'_>>) -> Option<String> {
    let matched = capture?;
    if unit_after_re().is_match(&prepared[matched.end()..]) {
        return None;
    }
    let value = normalize_amount(matched.as_str()).ok()?;
    if value > 100 && value <= 1_000_000_000 {
        Some(matched.as_str().trim().to_string())
    } else {
        None
    }
}

fn extract_buyer(prepared: &str) -> Option<String> {
    static VENDU_A: OnceLock<Regex> = OnceLock::new();
    static A_BEFORE_PRICE: OnceLock<Regex> = OnceLock::new();
    static EXPLICIT: OnceLock<Regex> = OnceLock::new();
    let patterns = [
        cached(&VENDU_A, r"\bvendu a ([a-z]{2,})\b"),
        cached(&A_BEFORE_PRICE, r"\ba ([a-z]{2,}) (?:pour|a) \d"),
        cached(&EXPLICIT, r"\b(?:acheteur|client|chez) ([a-z]{2,})\b"),
    ];

    for pattern in patterns {
        if let Some(captures) = pattern.captures(prepared) {
            let name = captures[1].to_string();
            if !BUYER_BLACKLIST.contains(&name.as_str()) {
                return Some(name);
            }
        }
    }
    None
}

fn extract_code(prepared: &str) -> Option<String> {
    code_re().captures(prepared).and_then(|captures| {
        captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|matched| matched.as_str().to_string())
    })
}

fn extract_category(prepared: &str) -> Option<&'static str> {
    static TABLE: [(&str, &[&str]); 7] = [
        ("alimentation", &["aliment", "provende", "nourriture", "ration", "sac", "mais", "soja"]),
        ("medicaments", &["medicament", "vaccin", "soin", "antibiotique"]),
        ("veterinaire", &["veterinaire", "veto", "consultation"]),
        ("entretien", &["entretien", "reparation", "maintenance"]),
        ("equipements", &["equipement", "materiel", "outil"]),
        ("salaires", &["salaire"]),
        ("transport", &["transport", "carburant", "essence"]),
    ];

    TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| prepared.contains(keyword)))
        .map(|(label, _)| *label)
}

fn extract_frequency(prepared: &str) -> Option<&'static str> {
    if prepared.contains("mensuel") || prepared.contains("par mois") || prepared.contains("chaque mois")
    {
        Some("mensuel")
    } else if prepared.contains("trimestriel") || prepared.contains("par trimestre") {
        Some("trimestriel")
    } else if prepared.contains("annuel")
        || prepared.contains("par an")
        || prepared.contains("chaque annee")
    {
        Some("annuel")
    } else {
        None
    }
}

fn extract_search_term(prepared: &str) -> String {
    prepared
        .split_whitespace()
        .filter(|token| !SEARCH_NOISE.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn score(action: ActionKind, parameters: &BTreeMap<String, String>) -> f64 {
    let required: Vec<&str> =
        action.schema().required_params().map(|spec| spec.name).collect();
    if required.is_empty() {
        return if parameters.is_empty() { 0.4 } else { 0.85 };
    }

    let found = required.iter().filter(|name| parameters.contains_key(**name)).count();
    if found == required.len() {
        0.92
    } else if found > 0 {
        0.65
    } else {
        0.3
    }
}

/// Canonicalized extraction output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedExtraction {
    pub parameters: ParameterSet,
    pub confidence: f64,
    /// Keys outside the schema or whose value the normalizer rejected.
    pub dropped: Vec<String>,
}

/// Adapter around an `Extractor` capability: stage policy plus schema-
/// checked normalization at the boundary.
pub struct ExtractorAdapter {
    extractor: Arc<dyn Extractor>,
    policy: StagePolicy,
}

impl ExtractorAdapter {
    pub fn new(extractor: Arc<dyn Extractor>, policy: StagePolicy) -> Self {
        Self { extractor, policy }
    }

    pub async fn extract(
        &self,
        text: &str,
        action: ActionKind,
    ) -> Result<NormalizedExtraction, CapabilityError> {
        let raw = self.policy.call(|| self.extractor.extract(text, action)).await?;
        Ok(normalize_extraction(action, raw))
    }
}

/// Applies the normalizer to every raw field, keyed by the action schema.
/// Normalization failures mark the field missing instead of failing the
/// decision.
pub fn normalize_extraction(action: ActionKind, raw: Extraction) -> NormalizedExtraction {
    let schema = action.schema();
    let mut parameters = ParameterSet::new();
    let mut dropped = Vec::new();

    for (name, value) in raw.parameters {
        let Some(spec) = schema.spec(&name) else {
            debug!(event_name = "extract.unknown_key", action = %action, key = %name, "dropping key outside schema");
            dropped.push(name);
            continue;
        };

        let normalized = match spec.kind {
            ParamType::Amount => normalize_amount(&value).ok().map(ParamValue::integer),
            ParamType::Weight => normalize_weight(&value).ok().map(ParamValue::Number),
            ParamType::Count => normalize_count(&value).ok().map(ParamValue::integer),
            ParamType::Code => Some(ParamValue::Text(normalize_code(&value))),
            ParamType::Text => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| ParamValue::text(trimmed))
            }
            ParamType::Date => parse_date(&value).map(ParamValue::Date),
        };

        match normalized {
            Some(param) => {
                parameters.insert(name, param);
            }
            None => {
                debug!(event_name = "extract.unparsable_value", action = %action, key = %name, raw = %value, "normalization failed, field stays missing");
                dropped.push(name);
            }
        }
    }

    NormalizedExtraction { parameters, confidence: raw.confidence, dropped }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if matches!(trimmed, "aujourd hui" | "aujourd'hui" | "aujourdhui") {
        return Some(Utc::now().date_naive());
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    // Day/month without a year defaults to the current year.
    let parts: Vec<&str> = trimmed.split(['/', '-']).collect();
    if let [day, month] = parts.as_slice() {
        let day: u32 = day.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        return NaiveDate::from_ymd_opt(Utc::now().year(), month, day);
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{normalize_extraction, ExtractorAdapter, RuleBasedExtractor};
    use crate::capabilities::{Extraction, Extractor, StagePolicy};
    use porcher_core::{ActionKind, ParamValue};

    fn adapter() -> ExtractorAdapter {
        ExtractorAdapter::new(
            Arc::new(RuleBasedExtractor),
            StagePolicy { timeout: Duration::from_millis(200), max_retries: 1 },
        )
    }

    #[tokio::test]
    async fn sale_sentence_yields_count_and_amount() {
        let extraction = adapter()
            .extract("j ai vendu 5 porcs a 800000", ActionKind::CreateRevenu)
            .await
            .expect("extracts");

        assert_eq!(extraction.parameters.get("nombre"), Some(&ParamValue::integer(5)));
        assert_eq!(extraction.parameters.get("montant"), Some(&ParamValue::integer(800_000)));
        assert!(extraction.confidence >= 0.9);
    }

    #[tokio::test]
    async fn amount_suffixes_are_canonicalized() {
        let with_k = adapter()
            .extract("j ai vendu 10 porcs a 800k", ActionKind::CreateRevenu)
            .await
            .expect("extracts");
        assert_eq!(with_k.parameters.get("nombre"), Some(&ParamValue::integer(10)));
        assert_eq!(with_k.parameters.get("montant"), Some(&ParamValue::integer(800_000)));

        let with_million = adapter()
            .extract("vente de 3 porcs pour 1 million", ActionKind::CreateRevenu)
            .await
            .expect("extracts");
        assert_eq!(with_million.parameters.get("montant"), Some(&ParamValue::integer(1_000_000)));
    }

    #[tokio::test]
    async fn grouped_digits_with_currency_parse() {
        let extraction = adapter()
            .extract("j ai vendu 2 porcs a 800 000 fcfa", ActionKind::CreateRevenu)
            .await
            .expect("extracts");
        assert_eq!(extraction.parameters.get("nombre"), Some(&ParamValue::integer(2)));
        assert_eq!(extraction.parameters.get("montant"), Some(&ParamValue::integer(800_000)));
    }

    #[tokio::test]
    async fn buyer_names_survive_next_to_amounts() {
        let extraction = adapter()
            .extract("j ai vendu 5 porcs a kouame pour 800000", ActionKind::CreateRevenu)
            .await
            .expect("extracts");
        assert_eq!(extraction.parameters.get("acheteur"), Some(&ParamValue::text("kouame")));
        assert_eq!(extraction.parameters.get("montant"), Some(&ParamValue::integer(800_000)));
    }

    #[tokio::test]
    async fn weight_is_not_mistaken_for_amount() {
        let extraction = adapter()
            .extract("j ai vendu 5 porcs de 50 kg a 800000", ActionKind::CreateRevenu)
            .await
            .expect("extracts");
        assert_eq!(extraction.parameters.get("montant"), Some(&ParamValue::integer(800_000)));
        assert_eq!(extraction.parameters.get("poids_kg"), Some(&ParamValue::Number(50.0)));
    }

    #[tokio::test]
    async fn weighing_sentence_yields_code_and_weight() {
        let extraction = adapter()
            .extract("peser p001 il fait 45 kg", ActionKind::CreatePesee)
            .await
            .expect("extracts");
        assert_eq!(extraction.parameters.get("animal_code"), Some(&ParamValue::text("P001")));
        assert_eq!(extraction.parameters.get("poids_kg"), Some(&ParamValue::Number(45.0)));
    }

    #[tokio::test]
    async fn decimal_weights_and_word_codes_normalize() {
        let extraction = adapter()
            .extract("p002 50.5 kg", ActionKind::CreatePesee)
            .await
            .expect("extracts");
        assert_eq!(extraction.parameters.get("animal_code"), Some(&ParamValue::text("P002")));
        assert_eq!(extraction.parameters.get("poids_kg"), Some(&ParamValue::Number(50.5)));

        let word_form = adapter()
            .extract("peser porc001 il fait 45 kg", ActionKind::CreatePesee)
            .await
            .expect("extracts");
        assert_eq!(word_form.parameters.get("animal_code"), Some(&ParamValue::text("P001")));
    }

    #[tokio::test]
    async fn expense_category_comes_from_keywords() {
        let provende = adapter()
            .extract("j ai achete 20 sacs de provende a 18000", ActionKind::CreateDepense)
            .await
            .expect("extracts");
        assert_eq!(provende.parameters.get("montant"), Some(&ParamValue::integer(18_000)));
        assert_eq!(provende.parameters.get("categorie"), Some(&ParamValue::text("alimentation")));

        let medicaments = adapter()
            .extract("depense de 50000 pour medicaments", ActionKind::CreateDepense)
            .await
            .expect("extracts");
        assert_eq!(medicaments.parameters.get("montant"), Some(&ParamValue::integer(50_000)));
        assert_eq!(medicaments.parameters.get("categorie"), Some(&ParamValue::text("medicaments")));
    }

    #[tokio::test]
    async fn fixed_charge_gets_label_and_frequency() {
        let extraction = adapter()
            .extract("abonnement eau 15000 par mois", ActionKind::CreateChargeFixe)
            .await
            .expect("extracts");
        assert_eq!(extraction.parameters.get("montant"), Some(&ParamValue::integer(15_000)));
        assert_eq!(
            extraction.parameters.get("libelle"),
            Some(&ParamValue::text("abonnement eau"))
        );
        assert_eq!(extraction.parameters.get("frequence"), Some(&ParamValue::text("mensuel")));
    }

    #[tokio::test]
    async fn search_terms_drop_query_keywords() {
        let extraction = adapter()
            .extract("chercher le lot 3", ActionKind::SearchAnimal)
            .await
            .expect("extracts");
        assert_eq!(extraction.parameters.get("recherche"), Some(&ParamValue::text("lot 3")));
    }

    #[tokio::test]
    async fn unparsable_amount_is_marked_missing_not_fatal() {
        struct BadAmount;

        #[async_trait::async_trait]
        impl Extractor for BadAmount {
            async fn extract(
                &self,
                _text: &str,
                _action: ActionKind,
            ) -> Result<Extraction, porcher_core::CapabilityError> {
                let mut parameters = std::collections::BTreeMap::new();
                parameters.insert("montant".to_string(), "beaucoup".to_string());
                parameters.insert("nombre".to_string(), "5".to_string());
                Ok(Extraction { parameters, confidence: 0.9 })
            }
        }

        let adapter = ExtractorAdapter::new(
            Arc::new(BadAmount),
            StagePolicy { timeout: Duration::from_millis(200), max_retries: 0 },
        );
        let extraction =
            adapter.extract("peu importe", ActionKind::CreateRevenu).await.expect("extracts");

        assert_eq!(extraction.parameters.get("nombre"), Some(&ParamValue::integer(5)));
        assert!(!extraction.parameters.contains_key("montant"));
        assert_eq!(extraction.dropped, vec!["montant".to_string()]);
    }

    #[test]
    fn keys_outside_the_schema_are_rejected() {
        let mut parameters = std::collections::BTreeMap::new();
        parameters.insert("poids_kg".to_string(), "45 kg".to_string());
        parameters.insert("couleur".to_string(), "rose".to_string());

        let normalized = normalize_extraction(
            ActionKind::CreatePesee,
            Extraction { parameters, confidence: 0.8 },
        );

        assert!(normalized.parameters.contains_key("poids_kg"));
        assert!(!normalized.parameters.contains_key("couleur"));
        assert_eq!(normalized.dropped, vec!["couleur".to_string()]);
    }
}

//! Canonical scenario batteries.
//!
//! Four fixed batteries: intent detection with minimum-confidence
//! expectations, parameter extraction with per-field tolerance rules,
//! robustness (same intents restated with other magnitudes and names) and
//! edge cases (single words, misspellings, accents, multi-number
//! sentences).

use porcher_core::{ActionKind, ParamValue};

/// Per-field comparison rule.
#[derive(Clone, Copy, Debug)]
pub enum Tolerance {
    Exact,
    CaseInsensitiveSubstring,
    Epsilon(f64),
}

#[derive(Clone, Debug)]
pub struct ParamExpectation {
    pub name: &'static str,
    pub expected: ParamValue,
    pub tolerance: Tolerance,
}

impl ParamExpectation {
    fn new(name: &'static str, expected: ParamValue, tolerance: Tolerance) -> Self {
        Self { name, expected, tolerance }
    }

    pub fn matches(&self, actual: Option<&ParamValue>) -> bool {
        let Some(actual) = actual else { return false };
        match self.tolerance {
            Tolerance::Exact => actual == &self.expected,
            Tolerance::Epsilon(epsilon) => match (actual.as_number(), self.expected.as_number()) {
                (Some(a), Some(b)) => (a - b).abs() < epsilon,
                _ => false,
            },
            Tolerance::CaseInsensitiveSubstring => {
                match (actual.as_text(), self.expected.as_text()) {
                    (Some(a), Some(b)) => {
                        let a = a.to_lowercase();
                        let b = b.to_lowercase();
                        a.contains(&b) || b.contains(&a)
                    }
                    _ => false,
                }
            }
        }
    }
}

/// What a scenario expects of the decision.
#[derive(Clone, Debug)]
pub enum Expectation {
    /// Actionable decision on this action, at or above this confidence.
    Action { action: ActionKind, min_confidence: f64 },
    /// Actionable decision on this action carrying these parameters.
    Parameters { action: ActionKind, params: Vec<ParamExpectation> },
    /// The utterance maps to no action; `Unrecognized` is the pass.
    Noise,
}

#[derive(Clone, Debug)]
pub struct TestCase {
    pub name: &'static str,
    pub utterance: &'static str,
    pub expectation: Expectation,
}

fn detect(name: &'static str, utterance: &'static str, action: ActionKind, min: f64) -> TestCase {
    TestCase { name, utterance, expectation: Expectation::Action { action, min_confidence: min } }
}

fn extract(
    name: &'static str,
    utterance: &'static str,
    action: ActionKind,
    params: Vec<ParamExpectation>,
) -> TestCase {
    TestCase { name, utterance, expectation: Expectation::Parameters { action, params } }
}

fn exact(name: &'static str, value: i64) -> ParamExpectation {
    ParamExpectation::new(name, ParamValue::integer(value), Tolerance::Exact)
}

fn close(name: &'static str, value: f64) -> ParamExpectation {
    ParamExpectation::new(name, ParamValue::Number(value), Tolerance::Epsilon(0.01))
}

fn text(name: &'static str, value: &str) -> ParamExpectation {
    ParamExpectation::new(name, ParamValue::text(value), Tolerance::Exact)
}

fn text_like(name: &'static str, value: &str) -> ParamExpectation {
    ParamExpectation::new(name, ParamValue::text(value), Tolerance::CaseInsensitiveSubstring)
}

/// Intent detection across the full action set.
pub fn detection_battery() -> Vec<TestCase> {
    use ActionKind::*;
    vec![
        detect("statistiques: question directe", "combien de porcs j ai", GetStatistics, 0.85),
        detect("statistiques: mot seul", "statistiques", GetStatistics, 0.9),
        detect("statistiques: formulation affichage", "montre moi mes porcs", GetStatistics, 0.85),
        detect("stocks: question provende", "combien de provende il reste", GetStockStatus, 0.9),
        detect("stocks: mot seul", "stocks", GetStockStatus, 0.9),
        detect("couts: question directe", "combien j ai depense", CalculateCosts, 0.9),
        detect("couts: possessif", "mes depenses", CalculateCosts, 0.85),
        detect("rappels: mot seul", "rappels", GetReminders, 0.9),
        detect("analyse: donnees", "analyser mes donnees", AnalyzeData, 0.9),
        detect("recherche: animal", "chercher un animal", SearchAnimal, 0.85),
        detect("vente: phrase complete", "j ai vendu 5 porcs a 800000", CreateRevenu, 0.9),
        detect("vente: variante pour", "vente de 3 porcs pour 500000", CreateRevenu, 0.9),
        detect("depense: achat de sacs", "j ai achete 20 sacs a 18000", CreateDepense, 0.9),
        detect("depense: medicaments", "depense de 50000 pour medicaments", CreateDepense, 0.9),
        detect(
            "charge fixe: salaires mensuels",
            "charge fixe de 100000 mensuelle pour salaires",
            CreateChargeFixe,
            0.9,
        ),
        detect("pesee: phrase complete", "peser p001 il fait 45 kg", CreatePesee, 0.9),
        detect("pesee: forme courte", "p001 45 kg", CreatePesee, 0.9),
    ]
}

/// Parameter extraction across amount/weight/buyer phrasing variants.
pub fn extraction_battery() -> Vec<TestCase> {
    use ActionKind::*;
    vec![
        extract(
            "montant en chiffres",
            "j ai vendu 5 porcs a 800000",
            CreateRevenu,
            vec![exact("nombre", 5), exact("montant", 800_000)],
        ),
        extract(
            "montant suffixe k",
            "j ai vendu 10 porcs a 800k",
            CreateRevenu,
            vec![exact("nombre", 10), exact("montant", 800_000)],
        ),
        extract(
            "montant en millions",
            "vente de 3 porcs pour 1 million",
            CreateRevenu,
            vec![exact("nombre", 3), exact("montant", 1_000_000)],
        ),
        extract(
            "montant groupe avec devise",
            "j ai vendu 2 porcs a 800 000 fcfa",
            CreateRevenu,
            vec![exact("nombre", 2), exact("montant", 800_000)],
        ),
        extract(
            "pesee avec code",
            "peser p001 il fait 45 kg",
            CreatePesee,
            vec![text("animal_code", "P001"), close("poids_kg", 45.0)],
        ),
        extract(
            "poids decimal",
            "p002 50.5 kg",
            CreatePesee,
            vec![text("animal_code", "P002"), close("poids_kg", 50.5)],
        ),
        extract(
            "pesee formulation pese",
            "p003 il pese 60 kg",
            CreatePesee,
            vec![text("animal_code", "P003"), close("poids_kg", 60.0)],
        ),
        extract(
            "acheteur nomme",
            "j ai vendu 5 porcs a kouame pour 800000",
            CreateRevenu,
            vec![
                exact("nombre", 5),
                exact("montant", 800_000),
                text_like("acheteur", "kouame"),
            ],
        ),
        extract(
            "depense categorisee alimentation",
            "j ai achete 20 sacs de provende a 18000",
            CreateDepense,
            vec![exact("montant", 18_000), text_like("categorie", "alimentation")],
        ),
        extract(
            "depense categorisee medicaments",
            "depense de 50000 pour medicaments",
            CreateDepense,
            vec![exact("montant", 50_000), text_like("categorie", "medicaments")],
        ),
    ]
}

/// Same intents restated with other magnitudes, names and codes.
pub fn robustness_battery() -> Vec<TestCase> {
    use ActionKind::*;
    vec![
        detect("vente: autre montant", "j ai vendu 10 porcs a 1500000", CreateRevenu, 0.75),
        detect("vente: suffixe k", "j ai vendu 3 porcs a 500k", CreateRevenu, 0.75),
        detect("vente: en millions", "j ai vendu 2 porcs a 1 million", CreateRevenu, 0.75),
        detect(
            "vente: acheteur traore",
            "j ai vendu 5 porcs a traore pour 800000",
            CreateRevenu,
            0.75,
        ),
        detect("vente: acheteur yao", "j ai vendu 5 porcs a yao pour 800000", CreateRevenu, 0.75),
        detect("vente: autre volume", "vente de 9 porcs pour 1300000", CreateRevenu, 0.75),
        detect("pesee: autre code", "peser p002 il fait 60 kg", CreatePesee, 0.75),
        detect("pesee: code en toutes lettres", "peser porc001 il fait 45 kg", CreatePesee, 0.75),
        detect("pesee: forme courte decimale", "p003 50.5 kg", CreatePesee, 0.75),
        detect(
            "depense: autre montant",
            "depense de 75000 pour medicaments",
            CreateDepense,
            0.75,
        ),
    ]
}

/// Single words, misspellings, accents, multi-number sentences, small talk.
pub fn edge_case_battery() -> Vec<TestCase> {
    use ActionKind::*;
    vec![
        detect("mot unique: statistiques", "statistiques", GetStatistics, 0.85),
        detect("mot unique: stocks", "stocks", GetStockStatus, 0.85),
        detect("singulier fautif", "combien de porc j ai", GetStatistics, 0.85),
        detect("vente au singulier fautif", "j ai vendu 5 porc a 800000", CreateRevenu, 0.75),
        detect("apostrophe et accents", "j'ai vendu 5 porcs à 800000", CreateRevenu, 0.75),
        extract(
            "plusieurs nombres dans la phrase",
            "j ai vendu 5 porcs de 50kg a 800000",
            CreateRevenu,
            vec![exact("nombre", 5), exact("montant", 800_000)],
        ),
        TestCase {
            name: "salutation sans intention",
            utterance: "bonjour",
            expectation: Expectation::Noise,
        },
        TestCase {
            name: "politesse sans intention",
            utterance: "merci beaucoup",
            expectation: Expectation::Noise,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::{
        detection_battery, edge_case_battery, extraction_battery, robustness_battery,
        ParamExpectation, Tolerance,
    };
    use porcher_core::{ActionKind, ParamValue};

    #[test]
    fn batteries_are_non_trivial() {
        assert!(detection_battery().len() >= 15);
        assert!(extraction_battery().len() >= 10);
        assert!(robustness_battery().len() >= 10);
        assert!(edge_case_battery().len() >= 8);
    }

    #[test]
    fn detection_covers_the_full_action_set() {
        let covered: Vec<ActionKind> = detection_battery()
            .iter()
            .filter_map(|case| match case.expectation {
                super::Expectation::Action { action, .. } => Some(action),
                _ => None,
            })
            .collect();
        for action in ActionKind::ALL {
            assert!(covered.contains(&action), "no detection case for {action}");
        }
    }

    #[test]
    fn tolerances_compare_as_documented() {
        let epsilon = ParamExpectation {
            name: "poids_kg",
            expected: ParamValue::Number(50.5),
            tolerance: Tolerance::Epsilon(0.01),
        };
        assert!(epsilon.matches(Some(&ParamValue::Number(50.504))));
        assert!(!epsilon.matches(Some(&ParamValue::Number(50.6))));
        assert!(!epsilon.matches(None));

        let substring = ParamExpectation {
            name: "acheteur",
            expected: ParamValue::text("kouame"),
            tolerance: Tolerance::CaseInsensitiveSubstring,
        };
        assert!(substring.matches(Some(&ParamValue::text("Kouame"))));
        assert!(substring.matches(Some(&ParamValue::text("monsieur kouame"))));
        assert!(!substring.matches(Some(&ParamValue::text("traore"))));

        let exact = ParamExpectation {
            name: "montant",
            expected: ParamValue::integer(800_000),
            tolerance: Tolerance::Exact,
        };
        assert!(exact.matches(Some(&ParamValue::integer(800_000))));
        assert!(!exact.matches(Some(&ParamValue::integer(800_001))));
    }
}

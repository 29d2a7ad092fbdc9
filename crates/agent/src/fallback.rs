//! Deterministic keyword fallback, the last line of defense.
//!
//! Runs only when retrieval and classification both failed to clear their
//! floors. Pure phrase matching over the folded utterance: no state, no
//! network, identical input always yields the identical candidate, which
//! also makes it the oracle for offline tests.
//!
//! Information queries are checked before record creations, mirroring how
//! the keyword tables were tuned: a farmer asking "combien j ai depense"
//! wants the total, not a new expense row.

use porcher_core::{fold_text, ActionKind, Candidate, StageSource};

/// Confidence boost applied to clear info/create keyword hits, capped so a
/// keyword match never outranks an exact corpus hit.
const BOOST: f64 = 0.1;
const BOOST_CAP: f64 = 0.95;

#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackDetector;

impl FallbackDetector {
    /// Keyword candidate for the utterance, or `None` when no table
    /// matches. Threshold filtering stays with the orchestrator.
    pub fn detect(&self, text: &str) -> Option<Candidate> {
        let folded = fold_text(text);
        if folded.is_empty() {
            return None;
        }

        if let Some(candidate) = detect_info(&folded) {
            return Some(boost(candidate));
        }
        if let Some(candidate) = detect_create(&folded) {
            return Some(boost(candidate));
        }
        detect_search(&folded)
    }
}

fn boost(mut candidate: Candidate) -> Candidate {
    candidate.confidence = (candidate.confidence + BOOST).min(BOOST_CAP);
    candidate
}

fn candidate(action: ActionKind, confidence: f64) -> Candidate {
    Candidate { action, confidence, source: StageSource::Fallback }
}

/// Whole-phrase match on the folded text; word boundaries come free from
/// space padding because folding already removed punctuation.
fn matches_any(folded: &str, keywords: &[&str]) -> bool {
    let padded = format!(" {folded} ");
    keywords.iter().any(|keyword| padded.contains(&format!(" {keyword} ")))
}

fn detect_info(folded: &str) -> Option<Candidate> {
    const STATS: &[&str] = &[
        "statistique", "statistiques", "bilan", "bilans", "combien de porc", "combien de porcs",
        "nombre de porc", "nombre de porcs", "combien porc", "combien porcs", "porc actif",
        "porcs actifs", "cheptel", "elevage", "resume", "apercu", "donnees", "chiffres", "total",
        "compte", "j ai combien", "mes animaux", "mes porcs", "effectif",
    ];
    const STOCKS: &[&str] = &[
        "stock", "stocks", "nourriture", "aliment", "aliments", "alimentation", "provende",
        "provendes", "ration", "rations", "quantite", "quantites", "reste", "restes",
        "disponible", "disponibles", "il reste", "il me reste", "niveau de stock",
        "niveaux de stock",
    ];
    const COSTS: &[&str] = &[
        "cout", "couts", "cout total", "couts totaux", "combien j ai depense",
        "j ai depense combien", "mes depenses", "depense totale", "depenses totales",
        "total des depenses", "calculer", "calcul", "calcule", "budget", "argent depense",
    ];
    const REMINDERS: &[&str] = &[
        "rappel", "rappels", "a faire", "tache", "taches", "programme", "planifie", "planifiee",
        "vaccination a venir", "traitement a venir", "visite prevue", "prochaine", "prochaines",
        "prochain", "calendrier", "agenda",
    ];
    const ANALYZE: &[&str] = &[
        "analyse", "analyses", "analyser", "situation", "evaluation", "evaluations",
        "diagnostic", "performance", "performances", "resultat", "resultats", "evolution",
        "evolutions", "tendance", "tendances", "comment va", "comment ca va", "mon exploitation",
        "mon elevage",
    ];

    if matches_any(folded, STATS) {
        return Some(candidate(ActionKind::GetStatistics, 0.9));
    }
    if matches_any(folded, STOCKS) {
        return Some(candidate(ActionKind::GetStockStatus, 0.9));
    }
    if matches_any(folded, COSTS) {
        return Some(candidate(ActionKind::CalculateCosts, 0.85));
    }
    if matches_any(folded, REMINDERS) {
        return Some(candidate(ActionKind::GetReminders, 0.85));
    }
    if matches_any(folded, ANALYZE) {
        return Some(candidate(ActionKind::AnalyzeData, 0.85));
    }
    None
}

fn detect_create(folded: &str) -> Option<Candidate> {
    const VENTE: &[&str] = &[
        "j ai vendu", "je vends", "je vend", "vente", "ventes", "vendu", "vendre",
    ];
    // Checked before the expense table so "depense mensuelle" lands on the
    // recurring charge, not a one-off expense.
    const CHARGE_FIXE: &[&str] = &[
        "charge fixe", "charges fixes", "charge permanente", "charge mensuelle",
        "depense mensuelle", "depense reguliere", "abonnement", "abonnements", "loyer",
    ];
    const DEPENSE: &[&str] = &[
        "j ai achete", "achete", "achetes", "depense", "depenses", "j ai depense", "achat",
        "achats", "payer", "paye", "payee", "j ai paye",
    ];
    const PESEE: &[&str] = &[
        "pesee", "pesees", "peser", "poids", "nouvelle pesee", "enregistrer le poids", "pesage",
    ];

    if matches_any(folded, VENTE) {
        return Some(candidate(ActionKind::CreateRevenu, 0.85));
    }
    if matches_any(folded, CHARGE_FIXE) {
        return Some(candidate(ActionKind::CreateChargeFixe, 0.8));
    }
    if matches_any(folded, DEPENSE) {
        return Some(candidate(ActionKind::CreateDepense, 0.85));
    }
    if matches_any(folded, PESEE) {
        return Some(candidate(ActionKind::CreatePesee, 0.85));
    }
    None
}

fn detect_search(folded: &str) -> Option<Candidate> {
    const SEARCH: &[&str] = &[
        "chercher", "cherche", "trouver", "trouve", "recherche", "rechercher", "ou est",
        "ou sont", "localiser", "localise", "montre moi", "montre", "affiche", "afficher",
    ];

    matches_any(folded, SEARCH).then(|| candidate(ActionKind::SearchAnimal, 0.75))
}

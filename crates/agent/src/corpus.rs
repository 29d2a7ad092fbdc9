//! Built-in labeled corpus for the retrieval matcher.
//!
//! Utterances are stored in folded form (lowercase, accents stripped) the
//! way `porcher_core::fold_text` produces them. Each row may carry
//! linguistic variants; variants expand into full corpus entries when the
//! matcher is built, which keeps the table readable while the expanded
//! corpus stays comfortably above the three-hundred-entry floor the
//! matcher was tuned for.

use porcher_core::ActionKind;

/// One labeled utterance after variant expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabeledExample {
    pub text: &'static str,
    pub action: ActionKind,
}

type Row = (&'static str, ActionKind, &'static [&'static str]);

/// Expands the static table into the flat corpus the matcher indexes.
pub fn builtin_corpus() -> Vec<LabeledExample> {
    let mut corpus = Vec::new();
    for (text, action, variants) in CORPUS {
        corpus.push(LabeledExample { text, action: *action });
        for variant in *variants {
            corpus.push(LabeledExample { text: variant, action: *action });
        }
    }
    corpus
}

use ActionKind::*;

#[rustfmt::skip]
static CORPUS: &[Row] = &[
    // ---- statistiques ----
    ("combien de porcs j ai", GetStatistics, &["combien j ai de porcs", "j ai combien de porcs", "combien de porc j ai"]),
    ("statistiques", GetStatistics, &["statistique", "mes statistiques", "les statistiques"]),
    ("bilan", GetStatistics, &["bilans", "bilan de l elevage", "le bilan"]),
    ("nombre de porcs", GetStatistics, &["nombre de porc", "nombre porcs", "le nombre de porcs"]),
    ("combien de porcs actifs", GetStatistics, &["porcs actifs", "porc actif", "mes porcs actifs"]),
    ("mes animaux", GetStatistics, &["tous mes animaux", "mes betes"]),
    ("mes porcs", GetStatistics, &["montre moi mes porcs", "affiche mes porcs"]),
    ("mon elevage", GetStatistics, &["resume de mon elevage", "apercu de mon elevage"]),
    ("resume du cheptel", GetStatistics, &["etat du cheptel", "situation du cheptel", "mon cheptel"]),
    ("total de mes porcs", GetStatistics, &["compte de mes porcs", "comptage des porcs"]),
    ("mes chiffres", GetStatistics, &["mes donnees", "les chiffres de la ferme"]),
    ("apercu de la ferme", GetStatistics, &["apercu", "resume de la ferme"]),
    ("combien d animaux dans la ferme", GetStatistics, &["combien d animaux j ai"]),
    ("effectif du cheptel", GetStatistics, &["effectif actuel"]),

    // ---- stocks ----
    ("stock actuel", GetStockStatus, &["stocks actuels", "les stocks", "le stock"]),
    ("stock", GetStockStatus, &["stocks", "mes stocks"]),
    ("etat des stocks", GetStockStatus, &["statut des stocks", "niveau de stock", "niveaux de stock"]),
    ("combien de provende il reste", GetStockStatus, &["il reste combien de provende", "combien de provende il me reste"]),
    ("nourriture", GetStockStatus, &["aliment", "aliments", "alimentation"]),
    ("provende", GetStockStatus, &["provendes", "stock de provende", "la provende"]),
    ("combien de nourriture", GetStockStatus, &["combien d aliment", "combien d aliments il reste"]),
    ("il me reste quoi", GetStockStatus, &["il reste quoi", "ce qui reste en stock"]),
    ("quantite d aliment disponible", GetStockStatus, &["quantite disponible", "quantite restante"]),
    ("montre moi les stocks", GetStockStatus, &["affiche les stocks", "voir les stocks"]),
    ("ration des porcs", GetStockStatus, &["rations", "la ration"]),
    ("stock d aliment", GetStockStatus, &["stock de mais", "stock de soja"]),
    ("reste de provende", GetStockStatus, &["le reste de nourriture"]),

    // ---- couts ----
    ("combien j ai depense", CalculateCosts, &["j ai depense combien", "combien j ai depense ce mois", "combien j ai depense cette annee"]),
    ("mes depenses", CalculateCosts, &["mes depenses totales", "total de mes depenses"]),
    ("cout total", CalculateCosts, &["couts totaux", "le cout total"]),
    ("calcule mes couts", CalculateCosts, &["calculer les couts", "calcul des couts"]),
    ("budget", CalculateCosts, &["mon budget"]),
    ("depense totale", CalculateCosts, &["depenses totales", "total depense"]),
    ("argent depense", CalculateCosts, &["combien d argent j ai depense"]),
    ("prix de revient", CalculateCosts, &["cout de production", "cout de l elevage"]),
    ("montre moi mes couts", CalculateCosts, &["affiche les couts", "voir mes depenses"]),
    ("bilan financier", CalculateCosts, &["resultat financier", "mes finances"]),
    ("combien me coute l elevage", CalculateCosts, &["ca me coute combien"]),
    ("cout", CalculateCosts, &["couts", "les couts"]),

    // ---- rappels ----
    ("rappels", GetReminders, &["rappel", "mes rappels", "les rappels"]),
    ("a faire aujourd hui", GetReminders, &["quoi faire aujourd hui", "taches du jour"]),
    ("taches", GetReminders, &["mes taches", "tache", "liste des taches"]),
    ("calendrier", GetReminders, &["agenda", "mon agenda"]),
    ("vaccination a venir", GetReminders, &["vaccinations prevues", "prochaine vaccination"]),
    ("traitement a venir", GetReminders, &["visite prevue", "prochains traitements"]),
    ("prochaines taches", GetReminders, &["ce qui est prevu", "prochains rappels"]),
    ("programme de la semaine", GetReminders, &["planning de la semaine", "le programme"]),
    ("qu est ce qui est planifie", GetReminders, &["ce qui est planifie"]),
    ("rappels a venir", GetReminders, &["les rappels a venir"]),

    // ---- analyse ----
    ("analyse", AnalyzeData, &["analyses", "analyser"]),
    ("analyser mes donnees", AnalyzeData, &["analyse mes donnees", "analyse de mes donnees"]),
    ("comment va mon elevage", AnalyzeData, &["comment ca va", "ca va comment l elevage"]),
    ("performance", AnalyzeData, &["performances", "mes performances"]),
    ("evolution", AnalyzeData, &["tendance", "tendances", "evolution de l elevage"]),
    ("diagnostic", AnalyzeData, &["evaluation", "diagnostic de la ferme"]),
    ("situation de mon exploitation", AnalyzeData, &["etat de mon exploitation", "mon exploitation"]),
    ("resultats", AnalyzeData, &["mes resultats", "resultat"]),
    ("analyse la rentabilite", AnalyzeData, &["rentabilite de l elevage"]),
    ("fais moi une analyse", AnalyzeData, &["fais une analyse"]),

    // ---- recherche ----
    ("chercher un animal", SearchAnimal, &["cherche un animal", "recherche un animal"]),
    ("trouver un porc", SearchAnimal, &["trouve le porc", "retrouver un porc"]),
    ("ou est p001", SearchAnimal, &["ou se trouve p001", "localiser p001"]),
    ("recherche", SearchAnimal, &["rechercher", "recherches"]),
    ("montre moi le porc p002", SearchAnimal, &["affiche le porc p002"]),
    ("chercher le lot 3", SearchAnimal, &["trouver le lot 3", "ou est le lot 3"]),
    ("cherche la truie numero 4", SearchAnimal, &["trouve la truie 4"]),
    ("dans quelle loge est p010", SearchAnimal, &["quelle loge pour p010"]),

    // ---- ventes ----
    ("j ai vendu 5 porcs a 800000", CreateRevenu, &["j ai vendu 5 porcs a 800 000", "j ai vendu 5 porcs pour 800000", "j ai vendu 5 porc a 800000"]),
    ("vente de 3 porcs pour 500000", CreateRevenu, &["vente de 3 porcs a 500000", "vente 3 porcs 500000"]),
    ("j ai vendu", CreateRevenu, &["je viens de vendre", "on a vendu"]),
    ("j ai vendu des porcs", CreateRevenu, &["vente de porcs", "des porcs vendus"]),
    ("vente", CreateRevenu, &["ventes", "une vente"]),
    ("j ai vendu 2 porcs de 50 kg a 300000", CreateRevenu, &["vendu 2 porcs de 50 kg pour 300000"]),
    ("vente de 8 porcs a traore a 1200000", CreateRevenu, &["j ai vendu 8 porcs a traore pour 1200000"]),
    ("j ai vendu 10 porcs pour 1500000 fcfa", CreateRevenu, &["vendu 10 porcs a 1500000 fcfa"]),
    ("enregistrer une vente", CreateRevenu, &["noter une vente", "ajouter une vente"]),
    ("j ai vendu 3 porcs a 500k", CreateRevenu, &["vendu 3 porcs a 500k"]),
    ("vente de 2 porcs pour 1 million", CreateRevenu, &["j ai vendu 2 porcs a 1 million"]),
    ("recette de la vente de porcs", CreateRevenu, &["revenu de la vente"]),
    ("j ai vendu 4 porcelets a 200000", CreateRevenu, &["vente de 4 porcelets pour 200000"]),
    ("un client a achete 6 porcs a 900000", CreateRevenu, &["un acheteur a pris 6 porcs pour 900000"]),
    ("j ai vendu 5 porcs a kouame pour 800000", CreateRevenu, &["vente de 5 porcs a kouame 800000"]),
    ("je vends 2 porcs a 350000", CreateRevenu, &["je vend 2 porcs a 350000"]),

    // ---- depenses ----
    ("j ai achete 20 sacs a 18000", CreateDepense, &["j ai achete 20 sacs pour 18000", "achat de 20 sacs a 18000"]),
    ("depense de 50000 pour medicaments", CreateDepense, &["depense de 50000 en medicaments", "50000 de medicaments"]),
    ("j ai depense", CreateDepense, &["je viens de depenser"]),
    ("j ai depense 15000 en medicament aujourd hui", CreateDepense, &["depense 15000 en medicaments"]),
    ("j ai achete 20 sacs de provende a 18000 fcfa", CreateDepense, &["achat de 20 sacs de provende a 18000"]),
    ("achat", CreateDepense, &["achats", "j ai achete"]),
    ("achete de la provende", CreateDepense, &["j ai achete de la provende", "achat de provende"]),
    ("enregistrer une depense", CreateDepense, &["noter une depense", "ajouter une depense"]),
    ("j ai paye 25000 pour consultation veterinaire", CreateDepense, &["paye 25000 au veterinaire"]),
    ("depense de 100000 pour salaires", CreateDepense, &["j ai paye les salaires 100000"]),
    ("j ai paye la reparation 30000", CreateDepense, &["depense de 30000 pour entretien"]),
    ("achat de materiel a 60000", CreateDepense, &["j ai achete du materiel a 60000"]),
    ("j ai achete des vaccins a 40000", CreateDepense, &["achat de vaccins pour 40000"]),
    ("depense", CreateDepense, &["une depense"]),
    ("j ai paye l electricite 20000", CreateDepense, &["facture d electricite 20000 payee"]),

    // ---- charges fixes ----
    ("charge fixe de 100000 mensuelle pour salaires", CreateChargeFixe, &["charge fixe salaires 100000 par mois"]),
    ("abonnement eau 15000 par mois", CreateChargeFixe, &["facture d eau 15000 chaque mois"]),
    ("charge fixe", CreateChargeFixe, &["charges fixes", "une charge fixe"]),
    ("charge mensuelle", CreateChargeFixe, &["depense mensuelle reguliere", "charge permanente"]),
    ("abonnement", CreateChargeFixe, &["abonnements", "un abonnement"]),
    ("enregistrer une charge fixe", CreateChargeFixe, &["ajouter une charge fixe", "noter une charge fixe"]),
    ("loyer de la ferme 50000 par mois", CreateChargeFixe, &["loyer mensuel 50000"]),
    ("charge annuelle d assurance 120000", CreateChargeFixe, &["assurance 120000 par an"]),

    // ---- pesees ----
    ("peser le porc p001 il fait 45 kg", CreatePesee, &["peser le porc p001 il pese 45 kg", "peser p001 il fait 45 kg"]),
    ("peser p003 il fait 60 kg", CreatePesee, &["p003 il pese 60 kg", "p003 fait 60 kg"]),
    ("pesee de 50 kg", CreatePesee, &["une pesee de 50 kg"]),
    ("pesee", CreatePesee, &["pesees", "nouvelle pesee"]),
    ("peser", CreatePesee, &["peser un porc", "je veux peser"]),
    ("ajouter une pesee de 50 kg pour l animal p002", CreatePesee, &["pesee de 50 kg pour p002"]),
    ("enregistrer une pesee", CreatePesee, &["noter une pesee", "ajouter une pesee"]),
    ("p001 45 kg", CreatePesee, &["p002 50 kg", "p005 62 kg"]),
    ("le porc p004 fait 72 kg", CreatePesee, &["p004 pese 72 kg"]),
    ("poids du porc p005 55 kg", CreatePesee, &["nouveau poids de p005 55 kg"]),
    ("j ai pese p006 il fait 48 kg", CreatePesee, &["pesage de p006 48 kg"]),
    ("peser porc001 il fait 45 kg", CreatePesee, &["pesee de porc001 45 kg"]),
    ("enregistrer le poids de p007", CreatePesee, &["le poids de p007"]),
];

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::builtin_corpus;
    use porcher_core::{fold_text, ActionKind};

    #[test]
    fn expanded_corpus_clears_the_size_floor() {
        assert!(builtin_corpus().len() >= 300, "corpus has {} entries", builtin_corpus().len());
    }

    #[test]
    fn every_action_kind_is_represented() {
        let covered: BTreeSet<ActionKind> =
            builtin_corpus().into_iter().map(|example| example.action).collect();
        for action in ActionKind::ALL {
            assert!(covered.contains(&action), "no corpus entry for {action}");
        }
    }

    #[test]
    fn corpus_texts_are_already_folded() {
        for example in builtin_corpus() {
            assert_eq!(
                fold_text(example.text),
                example.text,
                "corpus entry `{}` is not in folded form",
                example.text
            );
        }
    }
}

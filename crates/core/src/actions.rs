//! Farm action vocabulary and per-action parameter schemas.
//!
//! `ActionKind` is the closed set of structured actions the pipeline can
//! resolve an utterance to. Each action carries a static `ActionSchema`
//! describing which parameters it needs; the extractor boundary rejects
//! anything outside the schema.

use serde::{Deserialize, Serialize};

use crate::params::ParameterSet;

/// Closed enumeration of supported farm actions.
///
/// Wire names are the snake_case French labels the mobile client and the
/// labeled corpus both use (`create_revenu`, `get_statistics`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    GetStatistics,
    GetStockStatus,
    CalculateCosts,
    GetReminders,
    AnalyzeData,
    SearchAnimal,
    CreateRevenu,
    CreateDepense,
    CreateChargeFixe,
    CreatePesee,
}

impl ActionKind {
    pub const ALL: [ActionKind; 10] = [
        ActionKind::GetStatistics,
        ActionKind::GetStockStatus,
        ActionKind::CalculateCosts,
        ActionKind::GetReminders,
        ActionKind::AnalyzeData,
        ActionKind::SearchAnimal,
        ActionKind::CreateRevenu,
        ActionKind::CreateDepense,
        ActionKind::CreateChargeFixe,
        ActionKind::CreatePesee,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::GetStatistics => "get_statistics",
            Self::GetStockStatus => "get_stock_status",
            Self::CalculateCosts => "calculate_costs",
            Self::GetReminders => "get_reminders",
            Self::AnalyzeData => "analyze_data",
            Self::SearchAnimal => "search_animal",
            Self::CreateRevenu => "create_revenu",
            Self::CreateDepense => "create_depense",
            Self::CreateChargeFixe => "create_charge_fixe",
            Self::CreatePesee => "create_pesee",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.wire_name() == name)
    }

    /// Actions that record data and therefore need confirmation discipline,
    /// as opposed to read-only queries.
    pub fn records_data(&self) -> bool {
        matches!(
            self,
            Self::CreateRevenu | Self::CreateDepense | Self::CreateChargeFixe | Self::CreatePesee
        )
    }

    pub fn schema(&self) -> &'static ActionSchema {
        match self {
            Self::CreateRevenu => &REVENU_SCHEMA,
            Self::CreateDepense => &DEPENSE_SCHEMA,
            Self::CreateChargeFixe => &CHARGE_FIXE_SCHEMA,
            Self::CreatePesee => &PESEE_SCHEMA,
            Self::SearchAnimal => &SEARCH_SCHEMA,
            _ => &EMPTY_SCHEMA,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// How a parameter's raw extracted text must be canonicalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// FCFA amount (`800k`, `1 million`, `800 000 fcfa`).
    Amount,
    /// Weight in kilograms, decimal point allowed.
    Weight,
    /// Head count or quantity, plain integer.
    Count,
    /// Animal code canonicalized to `P<digits>`.
    Code,
    /// Free text kept as-is (trimmed).
    Text,
    /// Calendar date.
    Date,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub required: bool,
}

/// Static parameter schema for one action.
#[derive(Clone, Copy, Debug)]
pub struct ActionSchema {
    params: &'static [ParamSpec],
}

impl ActionSchema {
    pub fn params(&self) -> &'static [ParamSpec] {
        self.params
    }

    pub fn spec(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &'static ParamSpec> {
        self.params.iter().filter(|spec| spec.required)
    }

    pub fn has_required_params(&self) -> bool {
        self.params.iter().any(|spec| spec.required)
    }

    /// Names of required parameters not present in `resolved`.
    pub fn missing_required(&self, resolved: &ParameterSet) -> Vec<String> {
        self.required_params()
            .filter(|spec| !resolved.contains_key(spec.name))
            .map(|spec| spec.name.to_string())
            .collect()
    }
}

static EMPTY_SCHEMA: ActionSchema = ActionSchema { params: &[] };

static REVENU_SCHEMA: ActionSchema = ActionSchema {
    params: &[
        ParamSpec { name: "nombre", kind: ParamType::Count, required: true },
        ParamSpec { name: "montant", kind: ParamType::Amount, required: true },
        ParamSpec { name: "acheteur", kind: ParamType::Text, required: false },
        ParamSpec { name: "poids_kg", kind: ParamType::Weight, required: false },
        ParamSpec { name: "date", kind: ParamType::Date, required: false },
    ],
};

static DEPENSE_SCHEMA: ActionSchema = ActionSchema {
    params: &[
        ParamSpec { name: "montant", kind: ParamType::Amount, required: true },
        ParamSpec { name: "categorie", kind: ParamType::Text, required: false },
        ParamSpec { name: "description", kind: ParamType::Text, required: false },
        ParamSpec { name: "date", kind: ParamType::Date, required: false },
    ],
};

static CHARGE_FIXE_SCHEMA: ActionSchema = ActionSchema {
    params: &[
        ParamSpec { name: "montant", kind: ParamType::Amount, required: true },
        ParamSpec { name: "libelle", kind: ParamType::Text, required: true },
        ParamSpec { name: "frequence", kind: ParamType::Text, required: false },
    ],
};

static PESEE_SCHEMA: ActionSchema = ActionSchema {
    params: &[
        ParamSpec { name: "animal_code", kind: ParamType::Code, required: true },
        ParamSpec { name: "poids_kg", kind: ParamType::Weight, required: true },
        ParamSpec { name: "date", kind: ParamType::Date, required: false },
    ],
};

static SEARCH_SCHEMA: ActionSchema = ActionSchema {
    params: &[ParamSpec { name: "recherche", kind: ParamType::Text, required: false }],
};

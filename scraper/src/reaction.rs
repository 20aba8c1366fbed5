use serde::{Deserialize, Serialize};

/// One reaction from a listing page, split into its three component groups.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReactionRecord {
    pub reaction_id: String,
    pub reaction_smiles: String,
    pub reactant_smiles: String,
    pub solvent_smiles: String,
    pub product_smiles: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ReactionRecord {
    /// The `reactants>solvents>products` form of the parsed components.
    pub fn render(&self) -> String {
        format!(
            "{}>{}>{}",
            self.reactant_smiles, self.solvent_smiles, self.product_smiles
        )
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name.filter(|n| !n.trim().is_empty());
        self
    }
}

/// Parses `reactants>solvents>products`; `index` is the 0-based position of
/// the reaction within its dataset. Missing segments come back empty.
pub fn parse_reaction(raw: &str, index: usize) -> ReactionRecord {
    let mut segments: Vec<&str> = raw.split('>').collect();
    while segments.len() < 3 {
        segments.push("");
    }

    ReactionRecord {
        reaction_id: format!("reaction_{}", index + 1),
        reaction_smiles: raw.to_string(),
        reactant_smiles: join_tokens(segments[0]),
        solvent_smiles: join_tokens(segments[1]),
        product_smiles: join_tokens(segments[2]),
        name: None,
    }
}

fn join_tokens(segment: &str) -> String {
    segment
        .split('.')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

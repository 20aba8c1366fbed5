use std::fmt;

use crate::store::Document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetCount {
    /// Full DOI as stored, e.g. `DOI 10.1021/jacsau.4c01276`.
    pub dataset: String,
    pub reactions: usize,
}

/// Reaction counts per dataset, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub datasets: Vec<DatasetCount>,
    pub total_reactions: usize,
}

pub fn summarize(document: &Document) -> Summary {
    let mut datasets = Vec::new();
    for (doi_key, suffixes) in document {
        let Some(suffixes) = suffixes.as_object() else {
            continue;
        };
        for (suffix_key, reactions) in suffixes {
            let count = reactions.as_object().map_or(0, |r| r.len());
            datasets.push(DatasetCount {
                dataset: format!("{}{}", doi_key, suffix_key),
                reactions: count,
            });
        }
    }

    // stable, so ties keep document order
    datasets.sort_by(|a, b| b.reactions.cmp(&a.reactions));
    let total_reactions = datasets.iter().map(|d| d.reactions).sum();

    Summary {
        datasets,
        total_reactions,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rule = "=".repeat(80);
        let totals = format!(
            "{} datasets, {} total reactions",
            self.datasets.len(),
            self.total_reactions
        );

        writeln!(f, "\n{}", rule)?;
        writeln!(f, "SUMMARY: {}", totals)?;
        writeln!(f, "{}\n", rule)?;
        for d in &self.datasets {
            writeln!(f, "{}: {} reactions", d.dataset, d.reactions)?;
        }
        writeln!(f, "\n{}", rule)?;
        writeln!(f, "Total: {}", totals)?;
        write!(f, "{}", rule)
    }
}

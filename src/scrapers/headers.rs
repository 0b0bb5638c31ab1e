//! Maps a table's actual column headers to the semantic fields the pipeline
//! extracts. Pages re-render and reorder columns, so this runs once per page
//! against whatever header row is currently visible.

/// The columns the pipeline knows how to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticField {
    Symbol,
    Name,
    Price,
    Change,
    Volume,
    MarketCap,
    PeRatio,
}

impl SemanticField {
    /// Case-insensitive substring candidates matched against header labels.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            SemanticField::Symbol => &["symbol"],
            SemanticField::Name => &["name", "title"],
            SemanticField::Price => &["price", "last"],
            SemanticField::Change => &["change", "% change"],
            SemanticField::Volume => &["volume"],
            SemanticField::MarketCap => &["market cap", "marketcap"],
            SemanticField::PeRatio => &["pe", "pe ratio"],
        }
    }
}

/// Per-page mapping from semantic field to zero-based column position.
///
/// Identity and display-name fall back to fixed positions 0 and 1 when no
/// header matches; the numeric fields stay unresolved instead, because
/// silently reading the wrong numeric column is worse than omitting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIndex {
    pub symbol: usize,
    pub name: usize,
    pub price: Option<usize>,
    pub change: Option<usize>,
    pub volume: Option<usize>,
    pub market_cap: Option<usize>,
    pub pe_ratio: Option<usize>,
}

impl HeaderIndex {
    /// Resolve against the header labels in column order. Ties between
    /// overlapping keyword matches go to the leftmost column position.
    pub fn resolve(labels: &[String]) -> Self {
        let lowered: Vec<String> = labels.iter().map(|l| l.trim().to_lowercase()).collect();

        let find = |field: SemanticField| -> Option<usize> {
            lowered.iter().position(|label| {
                field.keywords().iter().any(|kw| label.contains(kw))
            })
        };

        HeaderIndex {
            symbol: find(SemanticField::Symbol).unwrap_or(0),
            name: find(SemanticField::Name).unwrap_or(1),
            price: find(SemanticField::Price),
            change: find(SemanticField::Change),
            volume: find(SemanticField::Volume),
            market_cap: find(SemanticField::MarketCap),
            pe_ratio: find(SemanticField::PeRatio),
        }
    }
}

//! Lazily built index of spells per class circle and domain circle.
//!
//! The index is built from the `spells` and `domains` tables on first use and
//! is immutable afterwards. A failed build leaves the cache empty and is
//! attempted again on the next `ensure_built`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arcanum_domain::{ClassId, DomainId, RuleRegistry, SpellId, MAX_SPELL_CIRCLE};
use tokio::sync::OnceCell;

use crate::infrastructure::ports::{PortError, StaticDataPort};
use crate::infrastructure::two_da::TwoDaTable;

pub const SPELLS_TABLE: &str = "spells";
pub const DOMAINS_TABLE: &str = "domains";

const DOMAIN_LABEL_COLUMN: &str = "Label";

#[derive(Debug, Default)]
struct CircleIndex {
    class_spells: HashMap<ClassId, BTreeMap<u8, Vec<SpellId>>>,
    domain_spells: HashMap<DomainId, BTreeMap<u8, SpellId>>,
}

pub struct SpellCircleCache {
    static_data: Arc<dyn StaticDataPort>,
    registry: Arc<RuleRegistry>,
    domain_row_limit: usize,
    index: OnceCell<CircleIndex>,
}

impl SpellCircleCache {
    pub fn new(
        static_data: Arc<dyn StaticDataPort>,
        registry: Arc<RuleRegistry>,
        domain_row_limit: usize,
    ) -> Self {
        Self {
            static_data,
            registry,
            domain_row_limit,
            index: OnceCell::new(),
        }
    }

    /// Build the index unless it already exists. Concurrent callers wait on a single build.
    pub async fn ensure_built(&self) -> Result<(), PortError> {
        self.index
            .get_or_try_init(|| self.build())
            .await
            .map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.index.initialized()
    }

    /// Spells of `class` at `circle`, empty for unknown keys or before the build.
    pub fn class_spells(&self, class: &ClassId, circle: u8) -> Vec<SpellId> {
        self.index
            .get()
            .and_then(|index| index.class_spells.get(class))
            .and_then(|circles| circles.get(&circle))
            .cloned()
            .unwrap_or_default()
    }

    pub fn domain_spell(&self, domain: &DomainId, circle: u8) -> Option<SpellId> {
        self.index
            .get()
            .and_then(|index| index.domain_spells.get(domain))
            .and_then(|circles| circles.get(&circle))
            .copied()
    }

    async fn build(&self) -> Result<CircleIndex, PortError> {
        let mut index = CircleIndex::default();

        let spells = self.static_data.load_table(SPELLS_TABLE).await?;
        for profile in self.registry.divine_casters() {
            let Some(column_name) = profile.spell_column.as_deref() else {
                continue;
            };
            let Some(column) = spells.column(column_name) else {
                tracing::warn!(
                    class = %profile.class,
                    column = column_name,
                    "Spell table has no column for class, skipping"
                );
                continue;
            };
            index
                .class_spells
                .insert(profile.class.clone(), class_circles(&spells, column));
        }

        if self.registry.casters().any(|p| p.has_domains) {
            let domains = self.static_data.load_table(DOMAINS_TABLE).await?;
            index.domain_spells = self.domain_circles(&domains);
        }

        tracing::info!(
            classes = index.class_spells.len(),
            domains = index.domain_spells.len(),
            "Spell circle cache built"
        );
        Ok(index)
    }

    fn domain_circles(&self, table: &TwoDaTable) -> HashMap<DomainId, BTreeMap<u8, SpellId>> {
        let mut domains = HashMap::new();
        let Some(label_column) = table.column(DOMAIN_LABEL_COLUMN) else {
            tracing::warn!("Domain table has no Label column, no domain spells available");
            return domains;
        };
        let circle_columns: Vec<(u8, usize)> = (1..=MAX_SPELL_CIRCLE)
            .filter_map(|circle| {
                table
                    .column(&format!("Level_{circle}"))
                    .map(|column| (circle, column))
            })
            .collect();

        for row in table.rows().iter().take(self.domain_row_limit) {
            let Some(label) = row.cell(label_column) else {
                continue;
            };
            let circles: BTreeMap<u8, SpellId> = circle_columns
                .iter()
                .filter_map(|(circle, column)| {
                    let spell = row.cell(*column)?.parse::<SpellId>().ok()?;
                    Some((*circle, spell))
                })
                .collect();
            if !circles.is_empty() {
                domains.insert(DomainId::new(label), circles);
            }
        }
        domains
    }
}

fn class_circles(table: &TwoDaTable, column: usize) -> BTreeMap<u8, Vec<SpellId>> {
    let mut circles: BTreeMap<u8, Vec<SpellId>> = BTreeMap::new();
    for row in table.rows() {
        let Some(cell) = row.cell(column) else {
            continue;
        };
        let Ok(circle) = cell.parse::<u8>() else {
            tracing::debug!(
                row = row.index,
                value = cell,
                "Spell circle cell is not a number, skipping"
            );
            continue;
        };
        if circle > MAX_SPELL_CIRCLE {
            continue;
        }
        circles
            .entry(circle)
            .or_default()
            .push(SpellId::new(row.index));
    }
    circles
}

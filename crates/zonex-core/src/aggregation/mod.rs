//! Grouping of per-zone records into per-person summaries.
//!
//! A name, a first name and an amount of the same form sit in three
//! different zones, so records are first assembled into forms, one per
//! `(page, variant)`. Forms are then attached to agents by their
//! `name_firstname` key; a form missing one side joins the compatible agent
//! it completes.

pub mod collation;

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::models::{
    AgentSummary, ExtractionRecord, FieldKind, FormVariant, Observation, UNREADABLE,
};

pub use collation::compare_names;

/// One filled-in form: the records sharing a page and a variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub page: u32,
    pub variant: FormVariant,
    pub name: String,
    pub first_name: String,
    pub amounts: Vec<Decimal>,
}

impl FormEntry {
    fn new(page: u32, variant: FormVariant) -> Self {
        Self {
            page,
            variant,
            name: String::new(),
            first_name: String::new(),
            amounts: Vec::new(),
        }
    }

    fn absorb(&mut self, record: &ExtractionRecord) {
        match record.kind {
            FieldKind::Name => fill_side(&mut self.name, &record.name),
            FieldKind::FirstName => fill_side(&mut self.first_name, &record.first_name),
            FieldKind::Amount => {
                if record.amount > Decimal::ZERO {
                    self.amounts.push(record.amount);
                }
            }
        }
    }

    /// `lowercase(name)_lowercase(first_name)`, trimmed.
    pub fn key(&self) -> String {
        person_key(&self.name, &self.first_name)
    }

    fn is_identifiable(&self) -> bool {
        let key = self.key();
        !(key.is_empty() || key == "_" || key == "unreadable_unreadable")
    }
}

fn fill_side(slot: &mut String, value: &str) {
    if value.is_empty() {
        return;
    }
    if slot.is_empty() || (slot == UNREADABLE && value != UNREADABLE) {
        *slot = value.to_string();
    }
}

fn person_key(name: &str, first_name: &str) -> String {
    format!("{}_{}", name.to_lowercase(), first_name.to_lowercase())
        .trim()
        .to_string()
}

/// Merge records into forms, in order of first appearance.
pub fn assemble_forms(records: &[ExtractionRecord]) -> Vec<FormEntry> {
    let mut forms: Vec<FormEntry> = Vec::new();
    for record in records {
        let position = forms
            .iter()
            .position(|f| f.page == record.page && f.variant == record.variant);
        let form = match position {
            Some(i) => &mut forms[i],
            None => {
                forms.push(FormEntry::new(record.page, record.variant));
                let last = forms.len() - 1;
                &mut forms[last]
            }
        };
        form.absorb(record);
    }
    forms
}

/// Accumulated state of one person.
#[derive(Debug, Clone)]
struct AgentState {
    /// `None` until a form supplies a value.
    name: Option<String>,
    first_name: Option<String>,
    amounts: Vec<Decimal>,
    pages: Vec<u32>,
}

impl AgentState {
    fn new() -> Self {
        Self {
            name: None,
            first_name: None,
            amounts: Vec::new(),
            pages: Vec::new(),
        }
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNREADABLE)
    }

    fn display_first_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or(UNREADABLE)
    }

    /// Whether `form` can complete this agent without contradicting it.
    fn accepts(&self, form: &FormEntry) -> bool {
        side_compatible(&form.name, self.name.as_deref())
            && side_compatible(&form.first_name, self.first_name.as_deref())
    }

    /// Whether at least one side is known on both and equal.
    fn agrees_with(&self, form: &FormEntry) -> bool {
        side_agrees(&form.name, self.name.as_deref())
            || side_agrees(&form.first_name, self.first_name.as_deref())
    }

    /// Key of the names known so far; a missing side counts as empty.
    fn key(&self) -> String {
        person_key(
            self.name.as_deref().unwrap_or_default(),
            self.first_name.as_deref().unwrap_or_default(),
        )
    }

    fn update(&mut self, form: &FormEntry) {
        replace_unreadable(&mut self.name, &form.name);
        replace_unreadable(&mut self.first_name, &form.first_name);
        self.amounts.extend(form.amounts.iter().copied());
        if !self.pages.contains(&form.page) {
            self.pages.push(form.page);
        }
    }

    fn finish(mut self) -> AgentSummary {
        self.pages.sort_unstable();
        let name = self.display_name().to_string();
        let first_name = self.display_first_name().to_string();
        let total = self.amounts.iter().copied().sum();

        let observation = if name.contains(UNREADABLE) || first_name.contains(UNREADABLE) {
            Observation::Unreadable
        } else if self.amounts.is_empty() {
            Observation::NoAmountFound
        } else {
            Observation::None
        };

        AgentSummary {
            key: person_key(&name, &first_name),
            name,
            first_name,
            amounts: self.amounts,
            total,
            pages: self.pages,
            observation,
        }
    }
}

fn side_compatible(form_side: &str, agent_side: Option<&str>) -> bool {
    match agent_side {
        None => true,
        Some(_) if form_side.is_empty() => true,
        Some(known) => known.to_lowercase() == form_side.to_lowercase(),
    }
}

fn side_agrees(form_side: &str, agent_side: Option<&str>) -> bool {
    match agent_side {
        Some(known) if !form_side.is_empty() => known.to_lowercase() == form_side.to_lowercase(),
        _ => false,
    }
}

fn replace_unreadable(slot: &mut Option<String>, value: &str) {
    if value.is_empty() {
        return;
    }
    let replaceable = slot.as_deref().is_none_or(|current| current.contains(UNREADABLE));
    if replaceable {
        *slot = Some(value.to_string());
    }
}

/// Builds the agent list of a document.
#[derive(Debug, Default)]
pub struct AgentAggregator {
    agents: Vec<AgentState>,
    by_key: HashMap<String, usize>,
}

impl AgentAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a whole document's records into sorted summaries.
    pub fn aggregate(records: &[ExtractionRecord]) -> Vec<AgentSummary> {
        let mut aggregator = Self::new();
        for form in assemble_forms(records) {
            aggregator.add_form(&form);
        }
        aggregator.finish()
    }

    /// Attach one form to an agent, creating it if needed.
    pub fn add_form(&mut self, form: &FormEntry) {
        if !form.is_identifiable() {
            trace!("Skipping form on page {} ({}): no identity", form.page, form.variant.as_str());
            return;
        }

        let key = form.key();
        let index = match self.find_agent(&key, form) {
            Some(index) => index,
            None => {
                debug!("New agent {:?} from page {}", key, form.page);
                self.agents.push(AgentState::new());
                self.agents.len() - 1
            }
        };
        self.by_key.entry(key).or_insert(index);
        self.agents[index].update(form);
        // A completed agent must be found by its full key as well
        let completed = self.agents[index].key();
        self.by_key.entry(completed).or_insert(index);
    }

    fn find_agent(&self, key: &str, form: &FormEntry) -> Option<usize> {
        if let Some(&index) = self.by_key.get(key) {
            return Some(index);
        }
        if !form.name.is_empty() && !form.first_name.is_empty() {
            return None;
        }

        let compatible: Vec<usize> = (0..self.agents.len())
            .rev()
            .filter(|&i| self.agents[i].accepts(form))
            .collect();
        let chosen = compatible
            .iter()
            .copied()
            .find(|&i| self.agents[i].agrees_with(form))
            .or_else(|| compatible.first().copied());

        if let Some(index) = chosen {
            debug!(
                "Form on page {} completes agent {} {}",
                form.page,
                self.agents[index].display_name(),
                self.agents[index].display_first_name()
            );
        }
        chosen
    }

    /// Finalize every agent and sort by display name.
    pub fn finish(self) -> Vec<AgentSummary> {
        let mut summaries: Vec<AgentSummary> =
            self.agents.into_iter().map(AgentState::finish).collect();
        summaries.sort_by(|a, b| {
            compare_names(
                &format!("{} {}", a.name, a.first_name),
                &format!("{} {}", b.name, b.first_name),
            )
        });
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rect, Resolution, Zone, ZoneTag};
    use pretty_assertions::assert_eq;

    fn record(tag: &str, page: u32, value: &str) -> ExtractionRecord {
        let zone = Zone::new("z", Rect::new(0.0, 0.0, 10.0, 10.0), ZoneTag::parse(tag).unwrap(), page)
            .unwrap();
        if value == UNREADABLE {
            return ExtractionRecord::unreadable(&zone);
        }
        let amount = crate::extraction::parse_amount(value);
        ExtractionRecord::resolved(&zone, value, value.to_string(), amount, Resolution::Direct)
    }

    #[test]
    fn test_forms_group_by_page_and_variant() {
        let records = vec![
            record("NAME-T1", 1, "DUPONT"),
            record("NAME-T2", 1, "MARTIN"),
            record("AMOUNT-T1", 1, "50"),
            record("FIRSTNAME-T1", 1, UNREADABLE),
            record("FIRSTNAME-T1", 1, "Jean"),
            record("AMOUNT-T1", 1, "0"),
        ];
        let forms = assemble_forms(&records);
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].name, "DUPONT");
        assert_eq!(forms[0].first_name, "Jean");
        assert_eq!(forms[0].amounts, vec![Decimal::new(50, 0)]);
        assert_eq!(forms[1].name, "MARTIN");
        assert_eq!(forms[1].variant, FormVariant::T2);
    }

    #[test]
    fn test_half_forms_merge_into_one_agent() {
        let records = vec![
            record("NAME-T1", 1, "DUPONT"),
            record("AMOUNT-T1", 1, "50"),
            record("FIRSTNAME-T1", 3, "Jean"),
            record("AMOUNT-T1", 3, "30"),
        ];
        let agents = AgentAggregator::aggregate(&records);

        assert_eq!(agents.len(), 1);
        let agent = &agents[0];
        assert_eq!(agent.name, "DUPONT");
        assert_eq!(agent.first_name, "Jean");
        assert_eq!(agent.amounts, vec![Decimal::new(50, 0), Decimal::new(30, 0)]);
        assert_eq!(agent.total, Decimal::new(80, 0));
        assert_eq!(agent.pages, vec![1, 3]);
        assert_eq!(agent.observation, Observation::None);
        assert_eq!(agent.key, "dupont_jean");
    }

    #[test]
    fn test_full_form_joins_agent_completed_by_half_forms() {
        let records = vec![
            record("NAME-T1", 1, "DUPONT"),
            record("AMOUNT-T1", 1, "50"),
            record("FIRSTNAME-T1", 2, "Jean"),
            record("AMOUNT-T1", 2, "30"),
            record("NAME-T1", 3, "DUPONT"),
            record("FIRSTNAME-T1", 3, "Jean"),
            record("AMOUNT-T1", 3, "20"),
        ];
        let agents = AgentAggregator::aggregate(&records);

        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].key, "dupont_jean");
        assert_eq!(agents[0].total, Decimal::new(100, 0));
        assert_eq!(agents[0].pages, vec![1, 2, 3]);
    }

    #[test]
    fn test_same_person_on_several_pages() {
        let records = vec![
            record("NAME-T1", 4, "Dupont"),
            record("FIRSTNAME-T1", 4, "Jean"),
            record("AMOUNT-T1", 4, "10"),
            record("NAME-T1", 2, "DUPONT"),
            record("FIRSTNAME-T1", 2, "JEAN"),
            record("AMOUNT-T1", 2, "5"),
        ];
        let agents = AgentAggregator::aggregate(&records);
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].name, "Dupont");
        assert_eq!(agents[0].pages, vec![2, 4]);
        assert_eq!(agents[0].total, Decimal::new(15, 0));
    }

    #[test]
    fn test_agents_sorted_by_display_name() {
        let records = vec![
            record("NAME-T1", 1, "Martin"),
            record("FIRSTNAME-T1", 1, "Zoé"),
            record("AMOUNT-T1", 1, "12"),
            record("NAME-T1", 2, "Dupont"),
            record("FIRSTNAME-T1", 2, "Abel"),
            record("AMOUNT-T1", 2, "7"),
            record("NAME-T1", 3, "Émery"),
            record("FIRSTNAME-T1", 3, "Luc"),
            record("AMOUNT-T1", 3, "3"),
        ];
        let agents = AgentAggregator::aggregate(&records);
        let names: Vec<&str> = agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Dupont", "Émery", "Martin"]);
    }

    #[test]
    fn test_unreadable_first_name_is_flagged() {
        let records = vec![
            record("NAME-T1", 1, "DUPONT"),
            record("FIRSTNAME-T1", 1, UNREADABLE),
            record("AMOUNT-T1", 1, "20"),
        ];
        let agents = AgentAggregator::aggregate(&records);
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].first_name, UNREADABLE);
        assert_eq!(agents[0].observation, Observation::Unreadable);
    }

    #[test]
    fn test_no_amount_found() {
        let records = vec![
            record("NAME-T1", 1, "DUPONT"),
            record("FIRSTNAME-T1", 1, "Jean"),
            record("AMOUNT-T1", 1, UNREADABLE),
        ];
        let agents = AgentAggregator::aggregate(&records);
        assert_eq!(agents[0].observation, Observation::NoAmountFound);
        assert_eq!(agents[0].total, Decimal::ZERO);
    }

    #[test]
    fn test_forms_without_identity_are_dropped() {
        let records = vec![
            record("AMOUNT-T1", 1, "40"),
            record("NAME-T1", 2, UNREADABLE),
            record("FIRSTNAME-T1", 2, UNREADABLE),
            record("AMOUNT-T1", 2, "15"),
        ];
        assert!(AgentAggregator::aggregate(&records).is_empty());
    }

    #[test]
    fn test_conflicting_half_forms_stay_apart() {
        let records = vec![
            record("NAME-T1", 1, "DUPONT"),
            record("FIRSTNAME-T1", 1, "Jean"),
            record("NAME-T1", 2, "MARTIN"),
            record("FIRSTNAME-T1", 3, "Jean"),
            record("AMOUNT-T1", 3, "9"),
        ];
        let agents = AgentAggregator::aggregate(&records);
        // Page 3 agrees with DUPONT Jean on the first name.
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].name, "DUPONT");
        assert_eq!(agents[0].pages, vec![1, 3]);
        assert_eq!(agents[1].name, "MARTIN");
        assert_eq!(agents[1].first_name, UNREADABLE);
    }
}

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    Multi,
}

/// Selected item indices for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selected {
    One(usize),
    Many(Vec<usize>),
}

impl Selected {
    pub fn contains(&self, item: usize) -> bool {
        match self {
            Selected::One(i) => *i == item,
            Selected::Many(items) => items.contains(&item),
        }
    }

    pub fn indices(&self) -> Vec<usize> {
        match self {
            Selected::One(i) => vec![*i],
            Selected::Many(items) => items.clone(),
        }
    }
}

/// Per-session record of what the user picked, keyed by section.
///
/// Items are identified by their position in the section's list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    entries: BTreeMap<String, Selected>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, section: &str, item: usize, mode: SelectionMode) {
        match mode {
            SelectionMode::Single => {
                self.entries.insert(section.to_owned(), Selected::One(item));
            }
            SelectionMode::Multi => {
                let entry = self
                    .entries
                    .entry(section.to_owned())
                    .or_insert_with(|| Selected::Many(Vec::new()));
                match entry {
                    Selected::Many(items) => {
                        if !items.contains(&item) {
                            items.push(item);
                        }
                    }
                    Selected::One(_) => *entry = Selected::Many(vec![item]),
                }
            }
        }
    }

    /// Single-select sections have no explicit deselect; picking another
    /// item is the only way to change them.
    pub fn deselect(&mut self, section: &str, item: usize, mode: SelectionMode) {
        if mode == SelectionMode::Single {
            return;
        }

        let Some(Selected::Many(items)) = self.entries.get_mut(section) else {
            return;
        };
        items.retain(|i| *i != item);
        if items.is_empty() {
            self.entries.remove(section);
        }
    }

    pub fn is_selected(&self, section: &str, item: usize) -> bool {
        self.entries
            .get(section)
            .is_some_and(|selected| selected.contains(item))
    }

    pub fn get(&self, section: &str) -> Option<&Selected> {
        self.entries.get(section)
    }

    pub fn snapshot(&self) -> BTreeMap<String, Selected> {
        self.entries.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Clause {
    pub id: String,
    pub code: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_clauses: Vec<Clause>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClauseGroup {
    pub id: String,
    pub title: String,
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Standard {
    pub key: String,
    pub name: String,
    pub groups: Vec<ClauseGroup>,
}

/// The part of a clause the classifier needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClauseDefinition {
    pub code: String,
    pub title: String,
    pub description: String,
}

impl Clause {
    pub fn definition(&self) -> ClauseDefinition {
        ClauseDefinition {
            code: self.code.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }

    fn find(&self, clause_id: &str) -> Option<&Clause> {
        if self.id == clause_id {
            return Some(self);
        }
        self.sub_clauses.iter().find_map(|c| c.find(clause_id))
    }
}

impl Standard {
    /// Depth-first search through groups, clauses and nested sub-clauses.
    pub fn find_clause(&self, clause_id: &str) -> Option<&Clause> {
        self.groups
            .iter()
            .flat_map(|g| g.clauses.iter())
            .find_map(|c| c.find(clause_id))
    }

    pub fn clause_definition(&self, clause_id: &str) -> Option<ClauseDefinition> {
        self.find_clause(clause_id).map(Clause::definition)
    }

    /// Text used to seed a new matrix row for `clause_id`.
    pub fn requirement_text(&self, clause_id: &str) -> String {
        match self.find_clause(clause_id) {
            Some(c) if !c.description.trim().is_empty() => c.description.clone(),
            Some(c) => c.title.clone(),
            None => placeholder_requirement(clause_id),
        }
    }

    /// Ids of every clause in a group, nested sub-clauses included. Used by
    /// "select whole group" bulk operations.
    pub fn group_clause_ids(&self, group_id: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(group) = self.groups.iter().find(|g| g.id == group_id) {
            for clause in &group.clauses {
                collect_ids(clause, &mut out);
            }
        }
        out
    }
}

fn collect_ids(clause: &Clause, out: &mut Vec<String>) {
    out.push(clause.id.clone());
    for sub in &clause.sub_clauses {
        collect_ids(sub, out);
    }
}

pub fn placeholder_requirement(clause_id: &str) -> String {
    format!("Requirement text not available for clause {}", clause_id)
}

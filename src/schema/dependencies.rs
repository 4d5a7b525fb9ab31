use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Orders tables so foreign-key parents are created before their children
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let deps = ALL_TABLES
            .iter()
            .map(|table| (table.name, table.dependencies()))
            .collect();

        Self { deps }
    }

    /// Return all tables in dependency order (parents before children)
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>> {
        // BTreeSet keeps the output stable between runs
        let included: BTreeSet<&str> = ALL_TABLES.iter().map(|t| t.name).collect();
        self.topological_sort(&included)
    }

    fn topological_sort(&self, included: &BTreeSet<&str>) -> Result<Vec<&'static TableSchema>> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for table_name in included {
            if !visited.contains(table_name) {
                self.visit(
                    table_name,
                    included,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                )?;
            }
        }

        Ok(result)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        included: &BTreeSet<&'a str>,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<()> {
        if temp_visited.contains(name) {
            return Err(Error::Schema(format!(
                "Circular dependency detected at: {}",
                name
            )));
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            let mut deps: Vec<&&'static str> = deps.iter().collect();
            deps.sort();
            for dep in deps {
                if *dep != name && included.contains(*dep) {
                    self.visit(dep, included, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        if let Some(table) = get_table(name) {
            result.push(table);
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// All tables in creation order
pub fn creation_order() -> Result<Vec<&'static TableSchema>> {
    DependencyResolver::new().creation_order()
}

//! Documentation entity type

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::entity::{Entity, ProjectEntity};

/// A project document made of titled articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    pub id: Uuid,

    pub project_id: String,

    /// Author
    pub employee_id: Uuid,

    #[serde(default)]
    pub employee_full_name: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime<Utc>,

    /// Article title -> article text
    #[serde(default)]
    pub body: BTreeMap<String, String>,
}

impl Entity for Documentation {
    const KIND: &'static str = "Documentation";

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ProjectEntity for Documentation {
    fn id(&self) -> Uuid {
        self.id
    }

    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    fn employee_full_name(&self) -> &str {
        &self.employee_full_name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Documentation {
    pub fn new(
        project_id: impl Into<String>,
        employee_id: Uuid,
        employee_full_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            employee_id,
            employee_full_name: employee_full_name.into(),
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            body: BTreeMap::new(),
        }
    }

    /// Add or replace an article
    pub fn with_article(mut self, title: impl Into<String>, text: impl Into<String>) -> Self {
        self.body.insert(title.into(), text.into());
        self
    }

    /// Split the body into parallel title/text columns
    pub fn article_columns(&self) -> (Vec<String>, Vec<String>) {
        self.body
            .iter()
            .map(|(t, a)| (t.clone(), a.clone()))
            .unzip()
    }

    /// Rebuild a body from parallel title/text columns. Extra entries in the
    /// longer column are dropped.
    pub fn body_from_columns(titles: Vec<String>, articles: Vec<String>) -> BTreeMap<String, String> {
        titles.into_iter().zip(articles).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_columns_rebuild_body() {
        let doc = Documentation::new("apollo", Uuid::new_v4(), "Lee Ann", "Guide")
            .with_article("Intro", "Hello")
            .with_article("Setup", "Install it");

        let (titles, articles) = doc.article_columns();
        assert_eq!(titles, vec!["Intro", "Setup"]);
        assert_eq!(Documentation::body_from_columns(titles, articles), doc.body);
    }
}

//! Employee entity type

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::entity::Entity;

/// An employee who can be assigned to projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,

    pub first_name: String,

    pub last_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,

    /// Derived from the name parts, see [`Employee::refresh_full_name`]
    #[serde(default)]
    pub full_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone_number: String,

    pub position: String,
}

impl Entity for Employee {
    const KIND: &'static str = "Employee";

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> &str {
        &self.full_name
    }
}

impl Employee {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        let mut employee = Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            patronymic: None,
            full_name: String::new(),
            birthday: None,
            email: String::new(),
            phone_number: String::new(),
            position: position.into(),
        };
        employee.refresh_full_name();
        employee
    }

    /// "Last First [Patronymic]"
    pub fn compose_full_name(first: &str, last: &str, patronymic: Option<&str>) -> String {
        let mut parts = vec![last.trim(), first.trim()];
        if let Some(p) = patronymic.map(str::trim).filter(|p| !p.is_empty()) {
            parts.push(p);
        }
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Recompute `full_name` after any name part changed; a blank
    /// patronymic is stored as absent
    pub fn refresh_full_name(&mut self) {
        if self.patronymic.as_deref().is_some_and(|p| p.trim().is_empty()) {
            self.patronymic = None;
        }
        self.full_name =
            Self::compose_full_name(&self.first_name, &self.last_name, self.patronymic.as_deref());
    }
}

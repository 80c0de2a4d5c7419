use std::fmt;

use crate::constants::{MEMBERS_PAGE_SIZE, MEMBER_FIELDS, TEAMS_PAGE_SIZE, TEAM_FIELDS};

/// Ordered GraphQL field selection builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<String>,
}

impl FieldSelection {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a simple field
    pub fn field(mut self, name: &str) -> Self {
        self.push(name.to_string());
        self
    }

    /// Add multiple simple fields
    pub fn fields(mut self, names: &[&str]) -> Self {
        for name in names {
            self.push(name.to_string());
        }
        self
    }

    /// Add a nested field with its own selection
    pub fn nested(mut self, name: &str, selection: FieldSelection) -> Self {
        self.push(format!("{} {{ {} }}", name, selection));
        self
    }

    /// Add a nested field with arguments
    pub fn nested_with_args(
        mut self,
        name: &str,
        args: &[(&str, &str)],
        selection: FieldSelection,
    ) -> Self {
        let args_str = args
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        self.push(format!("{}({}) {{ {} }}", name, args_str, selection));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    fn push(&mut self, field: String) {
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FieldSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(" "))
    }
}

/// Predefined field selections for the teams query
pub mod selections {
    use super::*;

    pub fn member_fields(include_email: bool) -> FieldSelection {
        let selection = FieldSelection::new().fields(MEMBER_FIELDS);
        if include_email {
            selection.field("email")
        } else {
            selection
        }
    }

    pub fn team_fields(include_email: bool) -> FieldSelection {
        let members_first = MEMBERS_PAGE_SIZE.to_string();
        FieldSelection::new()
            .fields(TEAM_FIELDS)
            .nested_with_args(
                "members",
                &[("first", members_first.as_str())],
                FieldSelection::new()
                    .field("totalCount")
                    .nested("pageInfo", FieldSelection::new().field("hasNextPage"))
                    .nested("nodes", member_fields(include_email)),
            )
    }

    /// Full paginated teams query taking `$org` and `$cursor` variables.
    pub fn teams_query(include_email: bool) -> String {
        let teams_first = TEAMS_PAGE_SIZE.to_string();
        let teams = FieldSelection::new()
            .nested("pageInfo", FieldSelection::new().fields(&["hasNextPage", "endCursor"]))
            .nested("nodes", team_fields(include_email));
        let organization = FieldSelection::new().nested_with_args(
            "teams",
            &[("first", teams_first.as_str()), ("after", "$cursor")],
            teams,
        );

        format!(
            "query ($org: String!, $cursor: String) {{ {} }}",
            FieldSelection::new().nested_with_args(
                "organization",
                &[("login", "$org")],
                organization,
            )
        )
    }
}

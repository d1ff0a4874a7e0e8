#![forbid(unsafe_code)]

use crate::error::DomainError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $unknown:ident, {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            pub fn parse(value: &str) -> Result<Self, DomainError> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(DomainError::$unknown(value.to_string())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Kind label carried by every Component node.
    ComponentKind, UnknownComponentKind, {
        File => "FILE",
        Function => "FUNCTION",
        Class => "CLASS",
        Module => "MODULE",
        System => "SYSTEM",
        Interface => "INTERFACE",
        Variable => "VARIABLE",
        Constant => "CONSTANT",
        Requirement => "REQUIREMENT",
        Specification => "SPECIFICATION",
        Feature => "FEATURE",
        UserStory => "USER_STORY",
        AcceptanceCriteria => "ACCEPTANCE_CRITERIA",
        TestCase => "TEST_CASE",
    }
}

wire_enum! {
    /// Directed edge type. `HasComment` and `RelatesTo` are internal plumbing
    /// (comment attachment, task-component links) and are never surfaced by
    /// relationship queries.
    RelationshipType, UnknownRelationshipType, {
        DependsOn => "DEPENDS_ON",
        Implements => "IMPLEMENTS",
        Extends => "EXTENDS",
        Contains => "CONTAINS",
        Calls => "CALLS",
        Imports => "IMPORTS",
        Exports => "EXPORTS",
        Overrides => "OVERRIDES",
        Uses => "USES",
        Creates => "CREATES",
        Satisfies => "SATISFIES",
        DerivesFrom => "DERIVES_FROM",
        Refines => "REFINES",
        TracesTo => "TRACES_TO",
        Validates => "VALIDATES",
        Verifies => "VERIFIES",
        ConflictsWith => "CONFLICTS_WITH",
        Supports => "SUPPORTS",
        AllocatesTo => "ALLOCATES_TO",
        Realizes => "REALIZES",
        Precedes => "PRECEDES",
        Follows => "FOLLOWS",
        Concurrent => "CONCURRENT",
        HasComment => "HAS_COMMENT",
        RelatesTo => "RELATES_TO",
    }
}

impl RelationshipType {
    pub fn is_internal(self) -> bool {
        matches!(self, Self::HasComment | Self::RelatesTo)
    }

    /// Parse a type supplied by a caller creating a relationship; internal
    /// kinds are rejected.
    pub fn parse_user(value: &str) -> Result<Self, DomainError> {
        let parsed = Self::parse(value)?;
        if parsed.is_internal() {
            return Err(DomainError::InternalRelationshipType(
                parsed.as_str().to_string(),
            ));
        }
        Ok(parsed)
    }
}

wire_enum! {
    TaskStatus, UnknownTaskStatus, {
        Todo => "TODO",
        InProgress => "IN_PROGRESS",
        Done => "DONE",
        Blocked => "BLOCKED",
        Cancelled => "CANCELLED",
    }
}

wire_enum! {
    /// Command priority; variants are declared lowest first so the derived
    /// ordering matches LOW < MEDIUM < HIGH < URGENT.
    Priority, UnknownPriority, {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Urgent => "URGENT",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

wire_enum! {
    EntityKind, UnknownEntityKind, {
        Component => "component",
        Relationship => "relationship",
        Task => "task",
        Comment => "comment",
    }
}

wire_enum! {
    /// Journal operation. Bulk variants mark items created through an
    /// all-or-nothing transaction.
    ChangeOperation, UnknownOperation, {
        CreateComponent => "CREATE_COMPONENT",
        UpdateComponent => "UPDATE_COMPONENT",
        DeleteComponent => "DELETE_COMPONENT",
        CreateRelationship => "CREATE_RELATIONSHIP",
        DeleteRelationship => "DELETE_RELATIONSHIP",
        CreateTask => "CREATE_TASK",
        UpdateTask => "UPDATE_TASK",
        CreateComment => "CREATE_COMMENT",
        UpdateComment => "UPDATE_COMMENT",
        DeleteComment => "DELETE_COMMENT",
        CreateComponentsBulk => "CREATE_COMPONENTS_BULK",
        CreateRelationshipsBulk => "CREATE_RELATIONSHIPS_BULK",
        CreateTasksBulk => "CREATE_TASKS_BULK",
    }
}

impl ChangeOperation {
    pub fn is_bulk(self) -> bool {
        matches!(
            self,
            Self::CreateComponentsBulk | Self::CreateRelationshipsBulk | Self::CreateTasksBulk
        )
    }

    pub fn entity_kind(self) -> EntityKind {
        match self {
            Self::CreateComponent
            | Self::UpdateComponent
            | Self::DeleteComponent
            | Self::CreateComponentsBulk => EntityKind::Component,
            Self::CreateRelationship
            | Self::DeleteRelationship
            | Self::CreateRelationshipsBulk => EntityKind::Relationship,
            Self::CreateTask | Self::UpdateTask | Self::CreateTasksBulk => EntityKind::Task,
            Self::CreateComment | Self::UpdateComment | Self::DeleteComment => EntityKind::Comment,
        }
    }
}

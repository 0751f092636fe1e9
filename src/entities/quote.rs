use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sales quote header. Monetary totals are always derived from the current
/// line set (see `services::quotes::calculate_totals`), never written directly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "quotes")]
#[serde(rename_all = "camelCase")]
#[schema(as = Quote)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Immutable once assigned, format `QUO-<year>-<seq>`.
    #[sea_orm(unique)]
    pub number: String,
    pub customer_id: Option<i32>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub status: QuoteStatus,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    #[schema(value_type = String, example = "400.00")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    #[schema(value_type = String, example = "80.00")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    #[schema(value_type = String, example = "480.00")]
    pub total_with_tax: Decimal,
    #[schema(value_type = String, format = DateTime)]
    pub valid_until: DateTimeUtc,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeUtc,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeUtc,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::quote_line::Entity")]
    QuoteLines,
}

impl Related<super::quote_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuoteLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Quote lifecycle status.
///
/// Transitions are directional: DRAFT -> SENT -> ACCEPTED | REJECTED, and
/// SENT -> EXPIRED via the expiration sweep. Nothing returns to DRAFT.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum QuoteStatus {
    #[sea_orm(string_value = "DRAFT")]
    #[serde(rename = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "SENT")]
    #[serde(rename = "SENT")]
    Sent,
    #[sea_orm(string_value = "ACCEPTED")]
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "REJECTED")]
    #[serde(rename = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "EXPIRED")]
    #[serde(rename = "EXPIRED")]
    Expired,
}

impl QuoteStatus {
    /// Explicit transition table for the lifecycle state machine.
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        matches!(
            (self, next),
            (QuoteStatus::Draft, QuoteStatus::Sent)
                | (QuoteStatus::Sent, QuoteStatus::Accepted)
                | (QuoteStatus::Sent, QuoteStatus::Rejected)
                | (QuoteStatus::Sent, QuoteStatus::Expired)
        )
    }

    /// Quotes can only be edited before they leave the drafting stage.
    pub fn is_editable(self) -> bool {
        self == QuoteStatus::Draft
    }

    /// Accepted quotes are commercial commitments and cannot be archived.
    pub fn is_deletable(self) -> bool {
        self != QuoteStatus::Accepted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Draft => "DRAFT",
            QuoteStatus::Sent => "SENT",
            QuoteStatus::Accepted => "ACCEPTED",
            QuoteStatus::Rejected => "REJECTED",
            QuoteStatus::Expired => "EXPIRED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QuoteStatus::*;

    #[test]
    fn draft_can_only_be_sent() {
        assert!(Draft.can_transition_to(Sent));
        assert!(!Draft.can_transition_to(Accepted));
        assert!(!Draft.can_transition_to(Rejected));
        assert!(!Draft.can_transition_to(Expired));
    }

    #[test]
    fn sent_branches_to_terminal_states() {
        assert!(Sent.can_transition_to(Accepted));
        assert!(Sent.can_transition_to(Rejected));
        assert!(Sent.can_transition_to(Expired));
        assert!(!Sent.can_transition_to(Draft));
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        for terminal in [Accepted, Rejected, Expired] {
            for next in [Draft, Sent, Accepted, Rejected, Expired] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn only_accepted_is_protected_from_archiving() {
        assert!(!Accepted.is_deletable());
        for status in [Draft, Sent, Rejected, Expired] {
            assert!(status.is_deletable());
        }
    }
}

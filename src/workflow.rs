//! Status lifecycles for the mill's tracked entities.
//!
//! Each status is a closed enum with an explicit transition table. Storage
//! routes every status write through [`Workflow::transition_to`], so an update
//! that is not in the table never reaches the database.

use diesel::{deserialize::FromSqlRow, expression::AsExpression, sql_types::Text};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::{app_error::AppError, sql_enum::impl_text_sql};

pub trait Workflow: Copy + Eq + std::fmt::Display + 'static {
    /// Entity name used in transition errors.
    const ENTITY: &'static str;

    fn can_transition_to(self, next: Self) -> bool;

    fn is_terminal(self) -> bool;

    fn transition_to(self, next: Self) -> Result<Self, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::IllegalTransition {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    QualityCheck,
    Approved,
    Rejected,
    InStorage,
}

impl_text_sql!(DeliveryStatus);

impl Workflow for DeliveryStatus {
    const ENTITY: &'static str = "delivery";

    fn can_transition_to(self, next: Self) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, QualityCheck)
                | (QualityCheck, Approved)
                | (QualityCheck, Rejected)
                | (Approved, InStorage)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Rejected | DeliveryStatus::InStorage)
    }
}

impl DeliveryStatus {
    /// A weighbridge reading approves its delivery from any state. Approving a
    /// delivery that was already rejected or put into storage is allowed but
    /// worth flagging.
    pub fn approval_by_weighing_is_irregular(self) -> bool {
        matches!(self, DeliveryStatus::Rejected | DeliveryStatus::InStorage)
    }
}

/// Shared by raw material batches, finished product batches and quality checks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QualityStatus {
    #[default]
    Pending,
    Passed,
    Failed,
    InReview,
}

impl_text_sql!(QualityStatus);

impl Workflow for QualityStatus {
    const ENTITY: &'static str = "batch quality status";

    fn can_transition_to(self, next: Self) -> bool {
        use QualityStatus::*;
        matches!(
            (self, next),
            (Pending, InReview)
                | (Pending, Passed)
                | (Pending, Failed)
                | (InReview, Passed)
                | (InReview, Failed)
                // re-test
                | (Failed, InReview)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, QualityStatus::Passed)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductionStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl_text_sql!(ProductionStatus);

impl Workflow for ProductionStatus {
    const ENTITY: &'static str = "production order";

    fn can_transition_to(self, next: Self) -> bool {
        use ProductionStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress)
                | (InProgress, Completed)
                | (Scheduled, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, ProductionStatus::Completed | ProductionStatus::Cancelled)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStatus {
    #[default]
    Scheduled,
    Dispatched,
    InTransit,
    Delivered,
}

impl_text_sql!(DispatchStatus);

impl Workflow for DispatchStatus {
    const ENTITY: &'static str = "dispatch order";

    fn can_transition_to(self, next: Self) -> bool {
        use DispatchStatus::*;
        matches!(
            (self, next),
            (Scheduled, Dispatched)
                | (Dispatched, InTransit)
                | (Dispatched, Delivered)
                | (InTransit, Delivered)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, DispatchStatus::Delivered)
    }
}

/// Displayed completion of a production order, capped at 100%.
pub fn progress_percent(completed: i32, target: i32) -> f64 {
    if target <= 0 {
        return 0.0;
    }
    (f64::from(completed) / f64::from(target) * 100.0).min(100.0)
}

/// Checks a progress update against the order it applies to. Completed
/// quantity only grows and never passes the target.
pub fn check_progress(current: i32, target: i32, requested: i32) -> Result<i32, AppError> {
    if requested < 0 {
        return Err(AppError::Validation(
            "Completed quantity cannot be negative".into(),
        ));
    }
    if requested > target {
        return Err(AppError::Validation(format!(
            "Completed quantity {} exceeds target quantity {}",
            requested, target
        )));
    }
    if requested < current {
        return Err(AppError::Validation(format!(
            "Completed quantity cannot decrease from {} to {}",
            current, requested
        )));
    }
    Ok(requested)
}

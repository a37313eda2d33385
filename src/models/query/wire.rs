use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{QueryFilter, QueryParams};
use crate::error::ScheduleError;
use crate::models::recurrence::RecurrenceKind;

const QUERY_NONE: u8 = 0;
const QUERY_TOP: u8 = 1;
const QUERY_RRULE: u8 = 2;

fn default_top() -> usize {
    1
}

/// JSON form of [`QueryParams`] shared with desktop front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParamsRecord {
    #[serde(default)]
    pub key: String,
    #[serde(rename = "dtStart")]
    pub dt_start: DateTime<Local>,
    #[serde(rename = "dtEnd")]
    pub dt_end: DateTime<Local>,
    #[serde(rename = "queryType", default)]
    pub query_type: u8,
    #[serde(rename = "queryTop", default = "default_top")]
    pub query_top: usize,
    #[serde(rename = "queryRRule", default)]
    pub query_rrule: u8,
}

impl From<&QueryParams> for QueryParamsRecord {
    fn from(params: &QueryParams) -> Self {
        let (query_type, query_top, query_rrule) = match params.filter {
            QueryFilter::All => (QUERY_NONE, default_top(), RecurrenceKind::None.code()),
            QueryFilter::Top(n) => (QUERY_TOP, n, RecurrenceKind::None.code()),
            QueryFilter::Kind(kind) => (QUERY_RRULE, default_top(), kind.code()),
        };

        Self {
            key: params.keyword.clone().unwrap_or_default(),
            dt_start: params.start,
            dt_end: params.end,
            query_type,
            query_top,
            query_rrule,
        }
    }
}

impl TryFrom<QueryParamsRecord> for QueryParams {
    type Error = ScheduleError;

    fn try_from(record: QueryParamsRecord) -> Result<Self, Self::Error> {
        let filter = match record.query_type {
            QUERY_NONE => QueryFilter::All,
            QUERY_TOP => QueryFilter::Top(record.query_top),
            QUERY_RRULE => QueryFilter::Kind(
                RecurrenceKind::from_code(record.query_rrule).ok_or_else(|| {
                    ScheduleError::InvalidRecurrence(format!(
                        "unknown recurrence code {}",
                        record.query_rrule
                    ))
                })?,
            ),
            other => {
                return Err(ScheduleError::Validation(format!("unknown query type {}", other)))
            }
        };

        let params = QueryParams {
            start: record.dt_start,
            end: record.dt_end,
            keyword: None,
            filter,
        }
        .keyword(record.key);
        params.range()?;
        Ok(params)
    }
}

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub persons: i64,
    pub groups: i64,
    pub loans: i64,
    pub total_loan_amount: Decimal,
    pub loans_by_status: BTreeMap<String, i64>,
}

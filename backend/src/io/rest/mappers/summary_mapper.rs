use shared::{format_cents, MonthlySummaryResponse};

use crate::domain::commands::summary::MonthlySummary;

pub struct SummaryMapper;

impl SummaryMapper {
    pub fn to_dto(domain: MonthlySummary) -> MonthlySummaryResponse {
        MonthlySummaryResponse {
            year: domain.year,
            month: domain.month,
            month_label: domain.label,
            revenue_cents: domain.revenue_cents,
            expenses_cents: domain.expenses_cents,
            profit_cents: domain.profit_cents,
            formatted_revenue: format_cents(domain.revenue_cents),
            formatted_expenses: format_cents(domain.expenses_cents),
            formatted_profit: format_cents(domain.profit_cents),
            warnings: domain.warnings,
        }
    }
}

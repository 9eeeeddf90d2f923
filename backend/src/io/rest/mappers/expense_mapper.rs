use shared::{
    format_cents, Expense as SharedExpense, ExpenseListResponse, RecordExpenseRequest,
    RecordExpenseResponse,
};

use crate::clock::{format_date, format_timestamp};
use crate::domain::commands::expenses::RecordExpenseCommand;
use crate::domain::models::expense::Expense;

pub struct ExpenseMapper;

impl ExpenseMapper {
    pub fn to_dto(domain: Expense) -> SharedExpense {
        SharedExpense {
            formatted_amount: format_cents(domain.amount_cents),
            id: domain.id,
            date: format_date(domain.date),
            category: domain.category,
            description: domain.description,
            amount_cents: domain.amount_cents,
            created_at: format_timestamp(domain.created_at),
        }
    }

    pub fn to_command(dto: RecordExpenseRequest) -> RecordExpenseCommand {
        RecordExpenseCommand {
            date: dto.date,
            category: dto.category,
            description: dto.description,
            amount: dto.amount,
        }
    }

    pub fn to_record_dto(domain: Expense) -> RecordExpenseResponse {
        RecordExpenseResponse {
            expense: Self::to_dto(domain),
            success_message: "Expense recorded.".to_string(),
        }
    }

    pub fn to_list_dto(expenses: Vec<Expense>) -> ExpenseListResponse {
        ExpenseListResponse { expenses: expenses.into_iter().map(Self::to_dto).collect() }
    }
}

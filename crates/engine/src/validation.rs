//! Field rules for every payload the client sends.
//!
//! Validation runs before any network call. Failures are collected per field
//! into [`ValidationErrors`], the same shape the API returns on `422`, so the
//! caller renders local and remote rejections the same way.

use std::fmt;

use api_types::{
    FieldErrors,
    account::{AccountNew, AccountUpdate},
    auth::{LoginCredentials, RegisterData},
    budget::{BudgetNew, BudgetUpdate},
    category::{CategoryNew, CategoryUpdate},
    goal::{GoalAmount, GoalNew, GoalUpdate},
    transaction::{TransactionNew, TransactionUpdate},
};

const MIN_PASSWORD_LEN: usize = 8;

/// Field -> messages collected by a failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(FieldErrors);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First message for `field`, as shown next to a form input.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.field(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> FieldErrors {
        self.0
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<FieldErrors> for ValidationErrors {
    fn from(value: FieldErrors) -> Self {
        Self(value)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A payload that can be checked locally.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn require_text(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn require_positive(errors: &mut ValidationErrors, field: &str, value: f64, message: &str) {
    if !value.is_finite() || value <= 0.0 {
        errors.add(field, message);
    }
}

fn require_id(errors: &mut ValidationErrors, field: &str, value: i64, message: &str) {
    if value <= 0 {
        errors.add(field, message);
    }
}

fn require_currency(errors: &mut ValidationErrors, value: &str) {
    let code = value.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        errors.add("currency", "Currency must be a 3-letter code");
    }
}

impl Validate for AccountNew {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name, "Account name is required");
        if !self.balance.is_finite() {
            errors.add("balance", "Balance must be a number");
        }
        require_currency(&mut errors, &self.currency);
        errors.into_result()
    }
}

impl Validate for AccountUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            require_text(&mut errors, "name", name, "Account name is required");
        }
        if let Some(balance) = self.balance
            && !balance.is_finite()
        {
            errors.add("balance", "Balance must be a number");
        }
        if let Some(currency) = &self.currency {
            require_currency(&mut errors, currency);
        }
        errors.into_result()
    }
}

impl Validate for CategoryNew {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name, "Category name is required");
        if let Some(parent) = self.parent_id {
            require_id(&mut errors, "parent_id", parent, "Please select a valid parent category");
        }
        errors.into_result()
    }
}

impl Validate for CategoryUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            require_text(&mut errors, "name", name, "Category name is required");
        }
        if let Some(parent) = self.parent_id {
            require_id(&mut errors, "parent_id", parent, "Please select a valid parent category");
        }
        errors.into_result()
    }
}

impl Validate for TransactionNew {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_id(&mut errors, "account_id", self.account_id, "Please select an account");
        require_id(&mut errors, "category_id", self.category_id, "Please select a category");
        require_positive(&mut errors, "amount", self.amount, "Amount must be greater than 0");
        if let Some(tags) = &self.tags
            && tags.iter().any(|tag| tag.trim().is_empty())
        {
            errors.add("tags", "Tags cannot be empty");
        }
        errors.into_result()
    }
}

impl Validate for TransactionUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(id) = self.account_id {
            require_id(&mut errors, "account_id", id, "Please select an account");
        }
        if let Some(id) = self.category_id {
            require_id(&mut errors, "category_id", id, "Please select a category");
        }
        if let Some(amount) = self.amount {
            require_positive(&mut errors, "amount", amount, "Amount must be greater than 0");
        }
        if let Some(tags) = &self.tags
            && tags.iter().any(|tag| tag.trim().is_empty())
        {
            errors.add("tags", "Tags cannot be empty");
        }
        errors.into_result()
    }
}

impl Validate for BudgetNew {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(id) = self.category_id {
            require_id(&mut errors, "category_id", id, "Please select a category");
        }
        require_positive(&mut errors, "amount", self.amount, "Amount must be greater than 0");
        if let Some(end) = self.end_date
            && end < self.start_date
        {
            errors.add("end_date", "End date must be on or after the start date");
        }
        errors.into_result()
    }
}

impl Validate for BudgetUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(id) = self.category_id {
            require_id(&mut errors, "category_id", id, "Please select a category");
        }
        if let Some(amount) = self.amount {
            require_positive(&mut errors, "amount", amount, "Amount must be greater than 0");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            errors.add("end_date", "End date must be on or after the start date");
        }
        errors.into_result()
    }
}

fn check_current_amount(errors: &mut ValidationErrors, current: f64) {
    if !current.is_finite() || current < 0.0 {
        errors.add("current_amount", "Current amount must be non-negative");
    }
}

impl Validate for GoalNew {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name, "Goal name is required");
        require_positive(
            &mut errors,
            "target_amount",
            self.target_amount,
            "Target amount must be greater than 0",
        );
        if let Some(current) = self.current_amount {
            check_current_amount(&mut errors, current);
        }
        errors.into_result()
    }
}

impl Validate for GoalUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            require_text(&mut errors, "name", name, "Goal name is required");
        }
        if let Some(target) = self.target_amount {
            require_positive(&mut errors, "target_amount", target, "Target amount must be greater than 0");
        }
        if let Some(current) = self.current_amount {
            check_current_amount(&mut errors, current);
        }
        errors.into_result()
    }
}

impl Validate for GoalAmount {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_positive(&mut errors, "amount", self.amount, "Amount must be greater than 0");
        errors.into_result()
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid {
        errors.add("email", "Please enter a valid email address");
    }
}

impl Validate for LoginCredentials {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

impl Validate for RegisterData {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name, "Name is required");
        check_email(&mut errors, &self.email);
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 8 characters");
        }
        if self.password != self.password_confirmation {
            errors.add("password_confirmation", "Passwords do not match");
        }
        errors.into_result()
    }
}

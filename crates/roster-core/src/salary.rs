//! Salary snapshots: derived in-hand pay, increments, and append-only
//! history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::EmployeeStore};

const MONTHS_PER_YEAR: i64 = 12;

/// Largest accepted annual amount.
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);
/// Largest accepted increment percentage.
const MAX_INCREMENT_PERCENT: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// A salary snapshot. The same shape is stored as the employee's current
/// salary and appended to their history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRecord {
  pub employee_id:       Uuid,
  pub basic_salary:      Decimal,
  pub allowances:        Decimal,
  pub deductions:        Decimal,
  /// Always `in_hand_salary(basic_salary, allowances, deductions)`.
  pub in_hand_salary:    Decimal,
  pub pay_date:          NaiveDate,
  pub increment_percent: Decimal,
  pub updated_at:        DateTime<Utc>,
}

/// Admin input for a salary change. Amounts must be numeric; strings such
/// as `"abc"` fail to deserialise instead of becoming zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SalaryInput {
  pub basic_salary:      Decimal,
  #[serde(default)]
  pub allowances:        Decimal,
  #[serde(default)]
  pub deductions:        Decimal,
  pub pay_date:          NaiveDate,
  #[serde(default)]
  pub increment_percent: Option<Decimal>,
}

/// Round to cents, halves away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn overflow(what: &str) -> Error {
  Error::Validation(format!("{what} is out of range"))
}

/// Monthly in-hand pay from annual figures.
pub fn in_hand_salary(basic: Decimal, allowances: Decimal, deductions: Decimal) -> Result<Decimal> {
  basic
    .checked_add(allowances)
    .and_then(|gross| gross.checked_sub(deductions))
    .and_then(|net| net.checked_div(Decimal::from(MONTHS_PER_YEAR)))
    .map(round_currency)
    .ok_or_else(|| overflow("in-hand salary"))
}

/// `basic × (1 + percent / 100)`, rounded to cents.
pub fn apply_increment(basic: Decimal, percent: Decimal) -> Result<Decimal> {
  percent
    .checked_div(Decimal::ONE_HUNDRED)
    .and_then(|fraction| Decimal::ONE.checked_add(fraction))
    .and_then(|factor| basic.checked_mul(factor))
    .map(round_currency)
    .ok_or_else(|| overflow("incremented basic salary"))
}

impl SalaryInput {
  fn validate(&self) -> Result<()> {
    let amounts = [
      ("basic salary", self.basic_salary),
      ("allowances", self.allowances),
      ("deductions", self.deductions),
      ("increment percent", self.increment_percent.unwrap_or_default()),
    ];
    for (name, value) in amounts {
      if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::Validation(format!("{name} must not be negative")));
      }
    }
    for (name, value) in &amounts[..3] {
      if *value > MAX_AMOUNT {
        return Err(Error::Validation(format!("{name} exceeds {MAX_AMOUNT}")));
      }
    }
    if self.increment_percent.unwrap_or_default() > MAX_INCREMENT_PERCENT {
      return Err(Error::Validation(format!(
        "increment percent exceeds {MAX_INCREMENT_PERCENT}"
      )));
    }
    Ok(())
  }
}

impl SalaryRecord {
  /// Build the next snapshot from `input`.
  ///
  /// A positive increment applies to the *current* basic salary when one
  /// exists, ignoring the supplied basic; otherwise the supplied basic is
  /// used as-is.
  pub fn compute(
    employee_id: Uuid,
    input: &SalaryInput,
    current: Option<&SalaryRecord>,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    input.validate()?;

    let increment = input.increment_percent.unwrap_or_default();
    let basic_salary = match current {
      Some(current) if increment > Decimal::ZERO => {
        apply_increment(current.basic_salary, increment)?
      }
      _ => input.basic_salary,
    };

    let in_hand = in_hand_salary(basic_salary, input.allowances, input.deductions)?;

    Ok(Self {
      employee_id,
      basic_salary,
      allowances: input.allowances,
      deductions: input.deductions,
      in_hand_salary: in_hand,
      pay_date: input.pay_date,
      increment_percent: increment,
      updated_at: now,
    })
  }
}

/// Replace the employee's current salary and append the same snapshot to
/// their history.
pub async fn upsert_salary<S: EmployeeStore>(
  store: &S,
  employee_id: Uuid,
  input: &SalaryInput,
  now: DateTime<Utc>,
) -> Result<SalaryRecord> {
  if employee_id.is_nil() {
    return Err(Error::Validation("no employee selected".into()));
  }
  if store
    .get_employee(employee_id)
    .await
    .map_err(Error::remote)?
    .is_none()
  {
    return Err(Error::NotFound(format!("employee {employee_id}")));
  }

  let current = store
    .current_salary(employee_id)
    .await
    .map_err(Error::remote)?;
  let record = SalaryRecord::compute(employee_id, input, current.as_ref(), now)?;

  store
    .record_salary(record.clone())
    .await
    .map_err(Error::remote)?;

  tracing::info!(
    %employee_id,
    basic = %record.basic_salary,
    in_hand = %record.in_hand_salary,
    updated = current.is_some(),
    "salary recorded"
  );
  Ok(record)
}

pub async fn current_salary<S: EmployeeStore>(
  store: &S,
  employee_id: Uuid,
) -> Result<Option<SalaryRecord>> {
  store.current_salary(employee_id).await.map_err(Error::remote)
}

/// Every snapshot ever recorded, oldest first.
pub async fn salary_history<S: EmployeeStore>(
  store: &S,
  employee_id: Uuid,
) -> Result<Vec<SalaryRecord>> {
  let mut history = store.salary_history(employee_id).await.map_err(Error::remote)?;
  history.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
  Ok(history)
}

//! Employee records: identity key, profile fields and the merge rule used by
//! upserts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Classification ──────────────────────────────────────────────────────────

/// Employment classification.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum EmploymentType {
  /// Full-time employee.
  #[serde(rename = "FTE")]
  #[strum(serialize = "FTE")]
  FullTime,
  #[serde(rename = "Intern")]
  #[strum(serialize = "Intern")]
  Intern,
}

impl EmploymentType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::FullTime => "FTE",
      Self::Intern => "Intern",
    }
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Descriptive employee fields.
///
/// Every field is optional. The same shape doubles as the candidate patch of
/// an upsert: a `Some` value overwrites, a `None` leaves the stored value
/// alone. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
  pub first_name:        Option<String>,
  pub middle_name:       Option<String>,
  pub last_name:         Option<String>,
  pub gender:            Option<String>,
  pub phone_number:      Option<String>,
  pub address:           Option<String>,
  pub city:              Option<String>,
  pub state:             Option<String>,
  pub zip:               Option<String>,
  pub employment_type:   Option<EmploymentType>,
  pub job_role:          Option<String>,
  pub joining_date:      Option<NaiveDate>,
  pub highest_education: Option<String>,
  pub education_status:  Option<String>,
  pub grade:             Option<String>,
  pub skills:            Option<String>,
  pub certifications:    Option<String>,
  pub internships:       Option<String>,
  pub achievements:      Option<String>,
  /// Reference (URL or storage key) to a profile image.
  pub profile_image:     Option<String>,
}

macro_rules! merge_fields {
  ($dst:expr, $src:expr; $($field:ident),+ $(,)?) => {
    $(
      if let Some(value) = $src.$field {
        $dst.$field = Some(value);
      }
    )+
  };
}

impl Profile {
  /// Overwrite every field that `patch` supplies; keep the rest.
  pub fn merge(&mut self, patch: Profile) {
    merge_fields!(self, patch;
      first_name, middle_name, last_name, gender, phone_number, address,
      city, state, zip, employment_type, job_role, joining_date,
      highest_education, education_status, grade, skills, certifications,
      internships, achievements, profile_image,
    );
  }

  /// Text fields covered by the employee list search.
  fn searchable(&self) -> impl Iterator<Item = &str> {
    [
      &self.first_name,
      &self.middle_name,
      &self.last_name,
      &self.skills,
      &self.achievements,
      &self.address,
      &self.gender,
      &self.city,
      &self.phone_number,
      &self.grade,
      &self.internships,
      &self.job_role,
    ]
    .into_iter()
    .filter_map(|f| f.as_deref())
    .chain(self.employment_type.map(EmploymentType::as_str))
  }
}

// ─── Employee ────────────────────────────────────────────────────────────────

/// A persisted employee. Exactly one record exists per email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id:   Uuid,
  /// Identity-provider account id; immutable once set.
  pub uid:           Uuid,
  pub email:         String,
  pub profile:       Profile,
  /// Legacy argon2 copy of the password. Never consulted for sign-in and
  /// never serialised outward.
  #[serde(skip_serializing, default)]
  pub password_hash: Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Employee {
  /// "First Middle Last" with blanks collapsed, or `"Unnamed Employee"`.
  pub fn display_name(&self) -> String {
    let name = [
      &self.profile.first_name,
      &self.profile.middle_name,
      &self.profile.last_name,
    ]
    .into_iter()
    .filter_map(|p| p.as_deref())
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join(" ");

    if name.is_empty() { "Unnamed Employee".to_owned() } else { name }
  }

  /// Case-insensitive substring match over the email and profile text.
  pub fn matches(&self, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    std::iter::once(self.email.as_str())
      .chain(self.profile.searchable())
      .any(|field| field.to_lowercase().contains(&needle))
  }
}

// ─── Query & summary ─────────────────────────────────────────────────────────

/// Parameters for [`EmployeeStore::list_employees`](crate::store::EmployeeStore::list_employees).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeQuery {
  /// Free-text filter, see [`Employee::matches`].
  pub text:            Option<String>,
  pub employment_type: Option<EmploymentType>,
}

impl EmployeeQuery {
  pub fn accepts(&self, employee: &Employee) -> bool {
    let type_ok = self
      .employment_type
      .is_none_or(|t| employee.profile.employment_type == Some(t));
    let text_ok = self
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .is_none_or(|t| employee.matches(t));
    type_ok && text_ok
  }
}

/// Head counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmployeeSummary {
  pub total:     usize,
  pub full_time: usize,
  pub interns:   usize,
}

impl EmployeeSummary {
  pub fn tally<'a>(employees: impl IntoIterator<Item = &'a Employee>) -> Self {
    employees.into_iter().fold(Self::default(), |mut acc, e| {
      acc.total += 1;
      match e.profile.employment_type {
        Some(EmploymentType::FullTime) => acc.full_time += 1,
        Some(EmploymentType::Intern) => acc.interns += 1,
        None => {}
      }
      acc
    })
  }
}

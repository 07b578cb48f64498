use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Employer,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Employer => "Employer",
            Role::Admin => "Admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employee" => Some(Role::Employee),
            "employer" => Some(Role::Employer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CareerLevel {
    Entry,
    Mid,
    Senior,
    Lead,
    Other,
}

impl CareerLevel {
    pub const fn label(self) -> &'static str {
        match self {
            CareerLevel::Entry => "entry",
            CareerLevel::Mid => "mid",
            CareerLevel::Senior => "senior",
            CareerLevel::Lead => "lead",
            CareerLevel::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationalStatus {
    Student,
    Graduate,
    Postgraduate,
    Other,
}

impl EducationalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EducationalStatus::Student => "student",
            EducationalStatus::Graduate => "graduate",
            EducationalStatus::Postgraduate => "postgraduate",
            EducationalStatus::Other => "other",
        }
    }
}

/// Career details an employee keeps on their profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub job_title: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_description: Option<String>,
    pub experience_level: CareerLevel,
    #[serde(default)]
    pub years_of_experience: u8,
    pub educational_status: EducationalStatus,
    #[serde(default)]
    pub last_work: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerDetails {
    pub industry: String,
    pub contact_name: String,
    pub contact_position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub job_info: JobInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfile {
    pub company_name: String,
    pub phone_number: String,
    pub details: EmployerDetails,
}

/// Role-specific profile data; the variant decides the principal's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum PrincipalProfile {
    Employee(EmployeeProfile),
    Employer(EmployerProfile),
    Admin,
}

impl PrincipalProfile {
    pub const fn role(&self) -> Role {
        match self {
            PrincipalProfile::Employee(_) => Role::Employee,
            PrincipalProfile::Employer(_) => Role::Employer,
            PrincipalProfile::Admin => Role::Admin,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            PrincipalProfile::Employee(profile) => {
                format!("{} {}", profile.first_name, profile.last_name)
            }
            PrincipalProfile::Employer(profile) => profile.company_name.clone(),
            PrincipalProfile::Admin => "Administrator".to_string(),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub password_hash: String,
    pub profile: PrincipalProfile,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(email: &str, password_hash: String, profile: PrincipalProfile) -> Self {
        let now = Utc::now();
        Self {
            id: PrincipalId::generate(),
            email: normalize_email(email),
            password_hash,
            profile,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub const fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn is(&self, role: Role) -> bool {
        self.role() == role
    }

    /// Case-insensitive substring match on email, display name, and username.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let username = match &self.profile {
            PrincipalProfile::Employee(profile) => Some(profile.username.as_str()),
            _ => None,
        };
        self.email.contains(&needle)
            || self.profile.display_name().to_lowercase().contains(&needle)
            || username.is_some_and(|name| name.to_lowercase().contains(&needle))
    }

    pub fn employee_profile(&self) -> Option<&EmployeeProfile> {
        match &self.profile {
            PrincipalProfile::Employee(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn employer_profile(&self) -> Option<&EmployerProfile> {
        match &self.profile {
            PrincipalProfile::Employer(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn view(&self) -> PrincipalView {
        PrincipalView {
            id: self.id.clone(),
            email: self.email.clone(),
            profile: self.profile.clone(),
            is_active: self.is_active,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role())
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// Public projection of a principal; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalView {
    pub id: PrincipalId,
    pub email: String,
    #[serde(flatten)]
    pub profile: PrincipalProfile,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub user_type: String,
    #[validate(email(message = "Invalid email format"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub job_info: Option<JobInfo>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub details: Option<EmployerDetails>,
}

impl RegisterRequest {
    /// Builds the role-specific profile, collecting every missing field.
    pub fn profile(&self, role: Role) -> Result<PrincipalProfile, Vec<String>> {
        let mut missing = Vec::new();
        match role {
            Role::Employee => {
                let username = required(&self.username, "Username is required", &mut missing);
                let first_name =
                    required(&self.first_name, "First name is required", &mut missing);
                let last_name = required(&self.last_name, "Last name is required", &mut missing);
                let job_info = match &self.job_info {
                    Some(info) if !info.job_title.trim().is_empty() => Some(info.clone()),
                    Some(_) => {
                        missing.push("Job title is required".to_string());
                        None
                    }
                    None => {
                        missing.push("Job information is required".to_string());
                        None
                    }
                };
                match (username, first_name, last_name, job_info) {
                    (Some(username), Some(first_name), Some(last_name), Some(job_info))
                        if missing.is_empty() =>
                    {
                        Ok(PrincipalProfile::Employee(EmployeeProfile {
                            username,
                            first_name,
                            last_name,
                            job_info,
                        }))
                    }
                    _ => Err(missing),
                }
            }
            Role::Employer => {
                let company_name =
                    required(&self.company_name, "Company name is required", &mut missing);
                let phone_number =
                    required(&self.phone_number, "Phone number is required", &mut missing);
                let details = match &self.details {
                    Some(details) => Some(details.clone()),
                    None => {
                        missing.push("Company details are required".to_string());
                        None
                    }
                };
                match (company_name, phone_number, details) {
                    (Some(company_name), Some(phone_number), Some(details))
                        if missing.is_empty() =>
                    {
                        Ok(PrincipalProfile::Employer(EmployerProfile {
                            company_name,
                            phone_number,
                            details,
                        }))
                    }
                    _ => Err(missing),
                }
            }
            Role::Admin => Ok(PrincipalProfile::Admin),
        }
    }
}

fn required(value: &Option<String>, message: &str, missing: &mut Vec<String>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => {
            missing.push(message.to_string());
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[serde(default)]
    pub password: String,
}

/// Self-service password change; the current password must be re-entered.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    #[validate(length(min = 1, message = "Current password is required"))]
    #[serde(default)]
    pub current_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters long"))]
    #[serde(default)]
    pub new_password: String,
}

/// Self-service profile edits. Email is immutable and silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub job_info: Option<JobInfo>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub details: Option<EmployerDetails>,
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, value, message) in [
            ("username", &self.username, "Username cannot be empty"),
            ("firstName", &self.first_name, "First name cannot be empty"),
            ("lastName", &self.last_name, "Last name cannot be empty"),
            ("companyName", &self.company_name, "Company name cannot be empty"),
            ("phoneNumber", &self.phone_number, "Phone number cannot be empty"),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                errors.add(field, blank(message));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ProfileUpdate {
    /// Applies the fields that belong to the profile's role; the rest are ignored.
    pub fn apply_to(self, profile: &mut PrincipalProfile) {
        match profile {
            PrincipalProfile::Employee(employee) => {
                if let Some(username) = self.username {
                    employee.username = username.trim().to_string();
                }
                if let Some(first_name) = self.first_name {
                    employee.first_name = first_name.trim().to_string();
                }
                if let Some(last_name) = self.last_name {
                    employee.last_name = last_name.trim().to_string();
                }
                if let Some(job_info) = self.job_info {
                    employee.job_info = job_info;
                }
            }
            PrincipalProfile::Employer(employer) => {
                if let Some(company_name) = self.company_name {
                    employer.company_name = company_name.trim().to_string();
                }
                if let Some(phone_number) = self.phone_number {
                    employer.phone_number = phone_number.trim().to_string();
                }
                if let Some(details) = self.details {
                    employer.details = details;
                }
            }
            PrincipalProfile::Admin => {}
        }
    }
}

pub(crate) fn blank(message: &'static str) -> ValidationError {
    ValidationError {
        code: Cow::Borrowed("blank"),
        message: Some(Cow::Borrowed(message)),
        params: HashMap::new(),
    }
}

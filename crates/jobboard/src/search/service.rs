use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::error::ApiError;
use crate::identity::domain::{
    CareerLevel, EducationalStatus, EmployeeProfile, Principal, Role,
};
use crate::identity::repository::{PrincipalFilter, PrincipalRepository};
use crate::jobs::domain::{Education, ExperienceLevel, Job, JobId, JobQuery, JobStatus};
use crate::jobs::repository::JobRepository;
use crate::policy::{self, Denied};
use crate::store::{tally, Page, PageRequest, RepositoryError};

pub const SUGGESTION_LIMIT: usize = 5;
const SKILLS_PER_SOURCE: usize = 10;
const POPULAR_SKILLS: usize = 20;
const LOCATION_SUGGESTIONS: usize = 10;

/// Categories are matched against posting titles.
pub const CATEGORIES: [&str; 10] = [
    "Technology",
    "Healthcare",
    "Finance",
    "Education",
    "Marketing",
    "Sales",
    "Design",
    "Engineering",
    "Customer Service",
    "Other",
];

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Job ID is required")]
    MissingJobId,
    #[error("Job not found")]
    JobNotFound,
    #[error("Query parameter is required")]
    MissingQuery,
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<SearchError> for ApiError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::MissingJobId | SearchError::MissingQuery => {
                ApiError::bad_request(value.to_string())
            }
            SearchError::JobNotFound => ApiError::not_found(value.to_string()),
            SearchError::Forbidden(denied) => denied.into(),
            SearchError::Repository(err) => err.into(),
        }
    }
}

/// Employee search as seen by employers.
#[derive(Debug, Clone, Default)]
pub struct CandidateQuery {
    /// Matches first name, last name, or any listed skill.
    pub text: Option<String>,
    /// A candidate matches when they list any of these.
    pub skills: Vec<String>,
    pub experience: Option<CareerLevel>,
    pub education: Option<EducationalStatus>,
}

impl CandidateQuery {
    pub fn matches(&self, profile: &EmployeeProfile) -> bool {
        if let Some(text) = self.text.as_deref().map(str::to_lowercase) {
            let hit = profile.first_name.to_lowercase().contains(&text)
                || profile.last_name.to_lowercase().contains(&text)
                || profile
                    .job_info
                    .skills
                    .iter()
                    .any(|skill| skill.to_lowercase().contains(&text));
            if !hit {
                return false;
            }
        }
        if !self.skills.is_empty() && !shares_skill(&profile.job_info.skills, &self.skills) {
            return false;
        }
        self.experience
            .map_or(true, |level| profile.job_info.experience_level == level)
            && self
                .education
                .map_or(true, |status| profile.job_info.educational_status == status)
    }
}

/// Public employer directory search.
#[derive(Debug, Clone, Default)]
pub struct EmployerQuery {
    /// Matches company name or industry.
    pub text: Option<String>,
    /// Exact industry, ignoring case.
    pub industry: Option<String>,
    /// Matches the location of any of the employer's postings.
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: &'static str,
    pub count: usize,
}

/// Discovery features that span postings and profiles.
pub struct SearchService<P, J> {
    principals: Arc<P>,
    jobs: Arc<J>,
}

impl<P, J> SearchService<P, J>
where
    P: PrincipalRepository + 'static,
    J: JobRepository + 'static,
{
    pub fn new(principals: Arc<P>, jobs: Arc<J>) -> Self {
        Self { principals, jobs }
    }

    /// Newest active postings sharing a skill, the experience level, or the
    /// education of the employee's profile. Without any of those, simply the
    /// newest active postings.
    pub fn job_suggestions(&self, principal: &Principal) -> Result<Vec<Job>, SearchError> {
        policy::require_role(principal, &[Role::Employee])?;
        let active = JobQuery {
            status: Some(JobStatus::Active),
            ..JobQuery::default()
        };
        let jobs = self.jobs.list(&active)?;

        let Some(profile) = principal.employee_profile() else {
            return Ok(Vec::new());
        };
        let info = &profile.job_info;
        let experience = job_experience(info.experience_level);
        let education = job_education(info.educational_status);
        if info.skills.is_empty() && experience.is_none() && education.is_none() {
            return Ok(jobs.into_iter().take(SUGGESTION_LIMIT).collect());
        }

        Ok(jobs
            .into_iter()
            .filter(|job| {
                shares_skill(&job.skills, &info.skills)
                    || experience == Some(job.experience)
                    || education == Some(job.education)
            })
            .take(SUGGESTION_LIMIT)
            .collect())
    }

    pub fn candidates(
        &self,
        principal: &Principal,
        query: &CandidateQuery,
        page: PageRequest,
    ) -> Result<Page<Principal>, SearchError> {
        policy::require_role(principal, &[Role::Employer, Role::Admin])?;
        let matches = self
            .principals
            .list(&PrincipalFilter::role(Role::Employee))?
            .into_iter()
            .filter(|candidate| {
                candidate
                    .employee_profile()
                    .is_some_and(|profile| query.matches(profile))
            })
            .collect();
        Ok(page.slice(matches))
    }

    /// Employees sharing a skill with the posting at its experience level.
    pub fn candidate_suggestions(
        &self,
        principal: &Principal,
        job_id: Option<&str>,
    ) -> Result<Vec<Principal>, SearchError> {
        policy::require_role(principal, &[Role::Employer, Role::Admin])?;
        let job_id = job_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(SearchError::MissingJobId)?;
        let job = self
            .jobs
            .fetch(&JobId(job_id.to_string()))?
            .ok_or(SearchError::JobNotFound)?;

        Ok(self
            .principals
            .list(&PrincipalFilter::role(Role::Employee))?
            .into_iter()
            .filter(|candidate| {
                candidate.employee_profile().is_some_and(|profile| {
                    shares_skill(&profile.job_info.skills, &job.skills)
                        && job_experience(profile.job_info.experience_level)
                            == Some(job.experience)
                })
            })
            .take(SUGGESTION_LIMIT)
            .collect())
    }

    pub fn employers(
        &self,
        query: &EmployerQuery,
        page: PageRequest,
    ) -> Result<Page<Principal>, SearchError> {
        let hiring_in: Option<HashSet<_>> = match query.location.as_deref() {
            Some(location) => Some(
                self.jobs
                    .list(&JobQuery {
                        location: Some(location.to_string()),
                        ..JobQuery::default()
                    })?
                    .into_iter()
                    .map(|job| job.employer_id)
                    .collect(),
            ),
            None => None,
        };
        let text = query.text.as_deref().map(str::to_lowercase);

        let matches = self
            .principals
            .list(&PrincipalFilter::role(Role::Employer))?
            .into_iter()
            .filter(|employer| {
                let Some(profile) = employer.employer_profile() else {
                    return false;
                };
                let text_hit = text.as_deref().map_or(true, |text| {
                    profile.company_name.to_lowercase().contains(text)
                        || profile.details.industry.to_lowercase().contains(text)
                });
                let industry_hit = query.industry.as_deref().map_or(true, |industry| {
                    profile.details.industry.eq_ignore_ascii_case(industry.trim())
                });
                let location_hit = hiring_in
                    .as_ref()
                    .map_or(true, |employers| employers.contains(&employer.id));
                text_hit && industry_hit && location_hit
            })
            .collect();
        Ok(page.slice(matches))
    }

    /// Top skills of postings and of employee profiles, summed.
    pub fn popular_skills(&self) -> Result<Vec<SkillCount>, SearchError> {
        let jobs = self.jobs.list(&JobQuery::default())?;
        let employees = self.principals.list(&PrincipalFilter::role(Role::Employee))?;

        let mut combined: HashMap<String, usize> = HashMap::new();
        let job_skills = tally(jobs.iter().flat_map(|job| job.skills.iter().cloned()));
        let employee_skills = tally(
            employees
                .iter()
                .filter_map(Principal::employee_profile)
                .flat_map(|profile| profile.job_info.skills.iter().cloned()),
        );
        for bucket in job_skills
            .into_iter()
            .take(SKILLS_PER_SOURCE)
            .chain(employee_skills.into_iter().take(SKILLS_PER_SOURCE))
        {
            *combined.entry(bucket.label).or_default() += bucket.count;
        }

        let mut skills: Vec<SkillCount> = combined
            .into_iter()
            .map(|(skill, count)| SkillCount { skill, count })
            .collect();
        skills.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill.cmp(&b.skill)));
        skills.truncate(POPULAR_SKILLS);
        Ok(skills)
    }

    pub fn categories(&self) -> Result<Vec<CategoryCount>, SearchError> {
        let titles: Vec<String> = self
            .jobs
            .list(&JobQuery::default())?
            .into_iter()
            .map(|job| job.title.to_lowercase())
            .collect();
        Ok(CATEGORIES
            .iter()
            .map(|&name| {
                let needle = name.to_lowercase();
                CategoryCount {
                    name,
                    count: titles.iter().filter(|title| title.contains(&needle)).count(),
                }
            })
            .collect())
    }

    /// Distinct posting locations containing `query`, newest postings first.
    pub fn locations(&self, query: Option<&str>) -> Result<Vec<String>, SearchError> {
        let query = query
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .ok_or(SearchError::MissingQuery)?;
        let jobs = self.jobs.list(&JobQuery {
            location: Some(query.to_string()),
            ..JobQuery::default()
        })?;

        let mut seen = HashSet::new();
        Ok(jobs
            .into_iter()
            .filter_map(|job| job.location)
            .filter(|location| seen.insert(location.clone()))
            .take(LOCATION_SUGGESTIONS)
            .collect())
    }
}

fn shares_skill(have: &[String], wanted: &[String]) -> bool {
    wanted.iter().any(|wanted| {
        have.iter()
            .any(|skill| skill.trim().eq_ignore_ascii_case(wanted.trim()))
    })
}

fn job_experience(level: CareerLevel) -> Option<ExperienceLevel> {
    match level {
        CareerLevel::Entry => Some(ExperienceLevel::Entry),
        CareerLevel::Mid => Some(ExperienceLevel::Mid),
        CareerLevel::Senior => Some(ExperienceLevel::Senior),
        CareerLevel::Lead | CareerLevel::Other => None,
    }
}

fn job_education(status: EducationalStatus) -> Option<Education> {
    match status {
        EducationalStatus::Student => Some(Education::BachelorStudent),
        EducationalStatus::Graduate => Some(Education::Bachelor),
        EducationalStatus::Postgraduate => Some(Education::Master),
        EducationalStatus::Other => Some(Education::Other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::domain::{
        EmployerDetails, EmployerProfile, JobInfo, PrincipalProfile,
    };
    use crate::jobs::domain::JobDraft;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};
    use serde_json::json;

    type Search = SearchService<MemoryStore, MemoryStore>;

    fn search(store: &Arc<MemoryStore>) -> Search {
        SearchService::new(store.clone(), store.clone())
    }

    fn employer(store: &MemoryStore, company: &str, industry: &str) -> Principal {
        PrincipalRepository::insert(
            store,
            Principal::new(
                &format!("hr@{}.test", company.to_lowercase()),
                "hash".into(),
                PrincipalProfile::Employer(EmployerProfile {
                    company_name: company.into(),
                    phone_number: "+1-555-0100".into(),
                    details: EmployerDetails {
                        industry: industry.into(),
                        contact_name: "Pat".into(),
                        contact_position: "Recruiter".into(),
                    },
                }),
            ),
        )
        .expect("employer stored")
    }

    fn employee(
        store: &MemoryStore,
        username: &str,
        skills: &[&str],
        level: CareerLevel,
        education: EducationalStatus,
    ) -> Principal {
        PrincipalRepository::insert(
            store,
            Principal::new(
                &format!("{username}@people.test"),
                "hash".into(),
                PrincipalProfile::Employee(EmployeeProfile {
                    username: username.into(),
                    first_name: username.to_uppercase(),
                    last_name: "Tester".into(),
                    job_info: JobInfo {
                        job_title: "Developer".into(),
                        skills: skills.iter().map(|skill| skill.to_string()).collect(),
                        experience_description: None,
                        experience_level: level,
                        years_of_experience: 3,
                        educational_status: education,
                        last_work: None,
                    },
                }),
            ),
        )
        .expect("employee stored")
    }

    fn job(store: &MemoryStore, owner: &Principal, overrides: serde_json::Value) -> Job {
        let mut payload = json!({
            "title": "Backend Engineer",
            "description": "Ship the platform",
            "requirements": ["Grit"],
            "responsibilities": ["Shipping"],
            "type": "Full time",
            "salary": { "min": 1000, "max": 2000 },
            "experience": "Senior",
            "education": "HighSchool",
            "skills": ["Go"],
        });
        if let (Some(base), Some(extra)) = (payload.as_object_mut(), overrides.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        let draft: JobDraft = serde_json::from_value(payload).expect("draft deserializes");
        JobRepository::insert(store, Job::from_draft(owner.id.clone(), draft)).expect("job stored")
    }

    #[test]
    fn suggestions_follow_profile_and_skip_inactive_postings() {
        let store = Arc::new(MemoryStore::new());
        let acme = employer(&store, "Acme", "Software");
        let dana = employee(
            &store,
            "dana",
            &["rust"],
            CareerLevel::Mid,
            EducationalStatus::Graduate,
        );
        let by_skill = job(&store, &acme, json!({ "title": "Rust Dev", "skills": ["Rust"] }));
        let by_level = job(&store, &acme, json!({ "title": "Mid Dev", "experience": "Mid" }));
        let by_degree = job(&store, &acme, json!({ "title": "Grad Dev", "education": "Bachelor" }));
        job(&store, &acme, json!({ "title": "Unrelated" }));
        job(
            &store,
            &acme,
            json!({ "title": "Closed", "skills": ["Rust"], "status": "Inactive" }),
        );

        let suggested = search(&store).job_suggestions(&dana).expect("suggestions");
        let mut ids: Vec<_> = suggested.into_iter().map(|job| job.id).collect();
        ids.sort();
        let mut expected = vec![by_skill.id, by_level.id, by_degree.id];
        expected.sort();
        assert_eq!(ids, expected);

        let err = search(&store)
            .job_suggestions(&acme)
            .expect_err("employers have no profile to match");
        assert!(matches!(err, SearchError::Forbidden(_)));
    }

    #[test]
    fn suggestions_cap_at_five() {
        let store = Arc::new(MemoryStore::new());
        let acme = employer(&store, "Acme", "Software");
        let dana = employee(
            &store,
            "dana",
            &["Go"],
            CareerLevel::Lead,
            EducationalStatus::Other,
        );
        for index in 0..7 {
            job(&store, &acme, json!({ "title": format!("Go role {index}") }));
        }
        let suggested = search(&store).job_suggestions(&dana).expect("suggestions");
        assert_eq!(suggested.len(), SUGGESTION_LIMIT);
    }

    #[test]
    fn candidate_search_is_for_employers_and_filters_profiles() {
        let store = Arc::new(MemoryStore::new());
        let acme = employer(&store, "Acme", "Software");
        let dana = employee(&store, "dana", &["Rust", "SQL"], CareerLevel::Mid, EducationalStatus::Graduate);
        employee(&store, "lee", &["Excel"], CareerLevel::Entry, EducationalStatus::Student);

        let err = search(&store)
            .candidates(&dana, &CandidateQuery::default(), PageRequest::default())
            .expect_err("employees cannot browse candidates");
        assert!(matches!(err, SearchError::Forbidden(_)));

        let query = CandidateQuery {
            skills: vec!["sql".into()],
            experience: Some(CareerLevel::Mid),
            ..CandidateQuery::default()
        };
        let page = search(&store)
            .candidates(&acme, &query, PageRequest::default())
            .expect("search");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, dana.id);

        let by_name = CandidateQuery {
            text: Some("LEE".into()),
            ..CandidateQuery::default()
        };
        let page = search(&store)
            .candidates(&acme, &by_name, PageRequest::default())
            .expect("search");
        assert_eq!(page.total, 1);
    }

    #[test]
    fn candidate_suggestions_need_a_known_job() {
        let store = Arc::new(MemoryStore::new());
        let acme = employer(&store, "Acme", "Software");
        let senior = employee(&store, "ana", &["go"], CareerLevel::Senior, EducationalStatus::Graduate);
        employee(&store, "bo", &["go"], CareerLevel::Entry, EducationalStatus::Graduate);
        employee(&store, "cy", &["java"], CareerLevel::Senior, EducationalStatus::Graduate);
        let posting = job(&store, &acme, json!({}));

        let service = search(&store);
        assert!(matches!(
            service.candidate_suggestions(&acme, None),
            Err(SearchError::MissingJobId)
        ));
        assert!(matches!(
            service.candidate_suggestions(&acme, Some("ghost")),
            Err(SearchError::JobNotFound)
        ));
        let suggested = service
            .candidate_suggestions(&acme, Some(&posting.id.0))
            .expect("suggestions");
        let ids: Vec<_> = suggested.into_iter().map(|candidate| candidate.id).collect();
        assert_eq!(ids, vec![senior.id]);
    }

    #[test]
    fn employer_search_matches_text_industry_and_posting_location() {
        let store = Arc::new(MemoryStore::new());
        let acme = employer(&store, "Acme Rockets", "Aerospace");
        let globex = employer(&store, "Globex", "Software");
        job(&store, &globex, json!({ "location": "Des Moines" }));

        let service = search(&store);
        let by_text = service
            .employers(
                &EmployerQuery {
                    text: Some("rocket".into()),
                    ..EmployerQuery::default()
                },
                PageRequest::default(),
            )
            .expect("search");
        assert_eq!(by_text.items[0].id, acme.id);
        assert_eq!(by_text.total, 1);

        let by_industry = service
            .employers(
                &EmployerQuery {
                    industry: Some("software".into()),
                    ..EmployerQuery::default()
                },
                PageRequest::default(),
            )
            .expect("search");
        assert_eq!(by_industry.items[0].id, globex.id);

        let by_location = service
            .employers(
                &EmployerQuery {
                    location: Some("moines".into()),
                    ..EmployerQuery::default()
                },
                PageRequest::default(),
            )
            .expect("search");
        assert_eq!(by_location.total, 1);
        assert_eq!(by_location.items[0].id, globex.id);
    }

    #[test]
    fn popular_skills_sum_postings_and_profiles() {
        let store = Arc::new(MemoryStore::new());
        let acme = employer(&store, "Acme", "Software");
        job(&store, &acme, json!({ "skills": ["Rust", "SQL"] }));
        job(&store, &acme, json!({ "skills": ["Rust"] }));
        employee(&store, "dana", &["Rust"], CareerLevel::Mid, EducationalStatus::Graduate);

        let skills = search(&store).popular_skills().expect("skills");
        assert_eq!(
            skills,
            vec![
                SkillCount { skill: "Rust".into(), count: 3 },
                SkillCount { skill: "SQL".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn categories_count_matching_titles() {
        let store = Arc::new(MemoryStore::new());
        let acme = employer(&store, "Acme", "Software");
        job(&store, &acme, json!({ "title": "Sales Lead" }));
        job(&store, &acme, json!({ "title": "Inside sales" }));
        job(&store, &acme, json!({ "title": "Design Engineer" }));

        let categories = search(&store).categories().expect("categories");
        assert_eq!(categories.len(), CATEGORIES.len());
        let count = |name: &str| {
            categories
                .iter()
                .find(|category| category.name == name)
                .map(|category| category.count)
        };
        assert_eq!(count("Sales"), Some(2));
        assert_eq!(count("Design"), Some(1));
        assert_eq!(count("Engineering"), Some(0));
    }

    #[test]
    fn locations_are_distinct_and_need_a_query() {
        let store = Arc::new(MemoryStore::new());
        let acme = employer(&store, "Acme", "Software");
        let mut older = job(&store, &acme, json!({ "location": "Des Moines" }));
        older.created_at = Utc::now() - Duration::days(1);
        JobRepository::update(store.as_ref(), older).expect("backdated");
        job(&store, &acme, json!({ "location": "Des Moines" }));
        job(&store, &acme, json!({ "location": "West Des Moines" }));
        job(&store, &acme, json!({ "location": "Ames" }));

        let service = search(&store);
        assert!(matches!(service.locations(Some("  ")), Err(SearchError::MissingQuery)));
        let locations = service.locations(Some("des")).expect("locations");
        assert_eq!(locations.len(), 2);
        assert!(locations.contains(&"Des Moines".to_string()));
        assert!(locations.contains(&"West Des Moines".to_string()));
    }
}

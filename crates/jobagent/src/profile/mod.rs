//! Applicant identity and the answer book used to fill screening questions.
//!
//! The answer book is an ordered lookup: direct-field matchers (name, email,
//! phone, ...) are evaluated before the keyword table, and within each group
//! the first match wins. Evaluation order is a total order, not a set; tests
//! rely on it.

/// Identity fields used to answer direct profile questions.
#[derive(Debug, Clone, Default)]
pub struct ApplicantProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub state_province: String,
    pub country: String,
    pub years_of_experience: String,
}

impl ApplicantProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

struct DirectMatcher {
    keywords: &'static [&'static str],
    answer: String,
}

/// Ordered mapping from field labels to pre-configured answers.
pub struct AnswerBook {
    direct: Vec<DirectMatcher>,
    table: Vec<(String, String)>,
}

impl AnswerBook {
    /// Build a book from a profile and an ordered keyword table. Table order
    /// is preserved; earlier entries shadow later ones.
    pub fn new(profile: &ApplicantProfile, table: Vec<(String, String)>) -> Self {
        // Years-of-experience is matched ahead of the name fields so that a
        // label like "Years of experience (full name required)" resolves to
        // the experience answer rather than the applicant's name.
        let direct = vec![
            DirectMatcher {
                keywords: &["years of experience", "how many years"],
                answer: profile.years_of_experience.clone(),
            },
            DirectMatcher {
                keywords: &["first name"],
                answer: profile.first_name.clone(),
            },
            DirectMatcher {
                keywords: &["last name", "surname", "family name"],
                answer: profile.last_name.clone(),
            },
            DirectMatcher {
                keywords: &["full name"],
                answer: profile.full_name(),
            },
            DirectMatcher {
                keywords: &["email"],
                answer: profile.email.clone(),
            },
            DirectMatcher {
                keywords: &["phone", "mobile", "telephone", "cell"],
                answer: profile.phone.clone(),
            },
            DirectMatcher {
                keywords: &["city"],
                answer: profile.city.clone(),
            },
            DirectMatcher {
                keywords: &["state", "province"],
                answer: profile.state_province.clone(),
            },
            DirectMatcher {
                keywords: &["country"],
                answer: profile.country.clone(),
            },
        ];

        Self { direct, table }
    }

    /// Build a book with the stock screening table.
    pub fn with_default_table(profile: &ApplicantProfile) -> Self {
        let years = profile.years_of_experience.clone();
        let table = default_table(years);
        Self::new(profile, table)
    }

    /// Resolve a field label to a configured answer. Matching is
    /// case-insensitive and substring-based; `None` means the caller must
    /// leave the field untouched rather than invent a value.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        let normalized = label.to_lowercase();
        let normalized = normalized.trim();

        for matcher in &self.direct {
            if matcher
                .keywords
                .iter()
                .any(|keyword| normalized.contains(keyword))
            {
                return Some(matcher.answer.as_str());
            }
        }

        for (keyword, answer) in &self.table {
            if normalized.contains(keyword.as_str()) {
                return Some(answer.as_str());
            }
        }

        None
    }
}

fn default_table(years_of_experience: String) -> Vec<(String, String)> {
    let entries: Vec<(&str, String)> = vec![
        // Work authorization
        ("authorized to work", "Yes".to_string()),
        ("legally authorized", "Yes".to_string()),
        ("work authorization", "Yes".to_string()),
        ("eligible to work", "Yes".to_string()),
        ("require sponsorship", "No".to_string()),
        ("need sponsorship", "No".to_string()),
        ("visa sponsorship", "No".to_string()),
        ("immigration sponsorship", "No".to_string()),
        // Relocation
        ("willing to relocate", "Yes".to_string()),
        ("open to relocation", "Yes".to_string()),
        ("relocate", "Yes".to_string()),
        // Remote work
        ("remote work", "Yes".to_string()),
        ("work remotely", "Yes".to_string()),
        ("comfortable working remotely", "Yes".to_string()),
        // Education
        ("highest level of education", "Master's Degree".to_string()),
        ("education level", "Master's Degree".to_string()),
        ("degree", "Master's Degree".to_string()),
        // Experience
        ("years of experience", years_of_experience.clone()),
        ("years of relevant experience", years_of_experience.clone()),
        ("how many years", years_of_experience),
        // Availability
        ("start date", "Immediately".to_string()),
        ("earliest start", "Immediately".to_string()),
        ("available to start", "Immediately".to_string()),
        ("notice period", "Immediately".to_string()),
        // Compensation
        ("salary expectation", "Open to discussion".to_string()),
        ("expected salary", "Open to discussion".to_string()),
        ("desired salary", "Open to discussion".to_string()),
        ("compensation", "Open to discussion".to_string()),
        // Demographics (decline where possible)
        ("gender", "Prefer not to say".to_string()),
        ("race", "Prefer not to say".to_string()),
        ("ethnicity", "Prefer not to say".to_string()),
        ("veteran", "No".to_string()),
        ("disability", "Prefer not to say".to_string()),
        // Misc
        ("how did you hear", "Online search".to_string()),
        ("cover letter", String::new()),
    ];

    entries
        .into_iter()
        .map(|(keyword, answer)| (keyword.to_string(), answer))
        .collect()
}

//! Platform strategy tables.
//!
//! Everything platform-specific (selector cascades, login procedures, URL
//! templates, terminal indicators) is data consumed by one generic engine.
//! Adding a platform means adding a table, not control flow.

pub mod indeed;
pub mod linkedin;

pub use indeed::INDEED;
pub use linkedin::LINKEDIN;

/// Locates a control either by CSS candidates or by scanning the text of a
/// bounded set of tags for known substrings (lowercase).
#[derive(Debug, Clone, Copy)]
pub struct ControlMatcher {
    pub css: &'static [&'static str],
    pub text_tags: &'static [&'static str],
    pub texts: &'static [&'static str],
}

/// Which credential a login step consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Email,
    Password,
}

/// One scripted login action.
#[derive(Debug, Clone, Copy)]
pub enum LoginStep {
    Fill {
        selectors: &'static [&'static str],
        value: CredentialField,
    },
    Click { control: ControlMatcher },
}

/// A platform's login procedure and its post-login signals.
#[derive(Debug, Clone, Copy)]
pub struct LoginScript {
    pub url: &'static str,
    pub steps: &'static [LoginStep],
    /// Fragment the post-login URL must contain; `None` means the script is
    /// trusted unless a challenge marker appears.
    pub success_url_fragment: Option<&'static str>,
    /// URL fragments that indicate a security checkpoint rather than a
    /// failed password.
    pub challenge_url_markers: &'static [&'static str],
}

/// Search URL construction data.
#[derive(Debug, Clone, Copy)]
pub struct SearchTemplate {
    pub base: &'static str,
    pub keyword_param: &'static str,
    pub location_param: &'static str,
    pub fixed_params: &'static [(&'static str, &'static str)],
    /// Alternate bases chosen when the location contains a marker.
    pub regional_bases: &'static [(&'static str, &'static str)],
}

impl SearchTemplate {
    pub fn build(&self, keywords: &str, location: &str) -> String {
        let lower = location.to_lowercase();
        let base = self
            .regional_bases
            .iter()
            .find(|(marker, _)| lower.contains(marker))
            .map(|(_, base)| *base)
            .unwrap_or(self.base);

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair(self.keyword_param, keywords);
        query.append_pair(self.location_param, location);
        for (key, value) in self.fixed_params {
            query.append_pair(key, value);
        }

        format!("{}?{}", base, query.finish())
    }
}

/// Selector cascades for the search results page.
#[derive(Debug, Clone, Copy)]
pub struct ListingSelectors {
    /// Joined selector used only to wait for results to render.
    pub card_wait: &'static str,
    /// Card strategies, most specific current layout first.
    pub card_cascade: &'static [&'static str],
    pub title: &'static [&'static str],
    pub company: &'static [&'static str],
    pub location: &'static [&'static str],
    pub link: &'static [&'static str],
    pub easy_apply_badge: &'static [&'static str],
    /// Last-resort scope: list items in the main content region.
    pub fallback_item: &'static str,
    pub job_link: &'static [&'static str],
    pub next_page: ControlMatcher,
}

/// Selectors and indicators for the application flow itself.
#[derive(Debug, Clone, Copy)]
pub struct FlowSelectors {
    pub open_apply: ControlMatcher,
    /// Text markers on the apply control that mean the application leaves
    /// the platform (skip those).
    pub external_markers: &'static [&'static str],
    pub confirmation: ControlMatcher,
    pub submit: ControlMatcher,
    pub review: ControlMatcher,
    pub next: ControlMatcher,
    pub dismiss: ControlMatcher,
    pub text_inputs: &'static [&'static str],
    pub selects: &'static str,
    pub choice_groups: &'static [&'static str],
    pub group_label: &'static [&'static str],
    pub file_input: &'static str,
}

/// Full strategy table for one platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub origin: &'static str,
    pub login: LoginScript,
    pub search: SearchTemplate,
    pub listing: ListingSelectors,
    pub flow: FlowSelectors,
    /// Regex with one capture group for the platform job id, applied to the
    /// canonical job URL. Diagnostics only; the URL itself is the dedup key.
    pub job_url_pattern: &'static str,
    /// Whether search results are already filtered to quick-apply listings.
    pub quick_apply_filtered: bool,
}

pub fn all() -> [&'static PlatformSpec; 2] {
    [&LINKEDIN, &INDEED]
}

pub fn by_id(id: &str) -> Option<&'static PlatformSpec> {
    all()
        .into_iter()
        .find(|spec| spec.id.eq_ignore_ascii_case(id))
}
